//! Transport behavior tests against mock servers.
//!
//! These cover the pacing and retry contract: minimum spacing between
//! dispatches, 429 cooldown-and-retry, and the bounded network-failure
//! retry budget. Cooldowns are configured in tens of milliseconds so
//! the suite stays fast.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tome_api::{HttpWorkspace, PacingConfig, RunLog, Transport};
use tome_core::{ApiUrl, Error, Workspace};

fn fast_pacing() -> PacingConfig {
    PacingConfig {
        min_interval: Duration::from_millis(0),
        rate_limit_cooldown: Duration::from_millis(50),
        error_cooldown: Duration::from_millis(10),
        max_retries: 3,
    }
}

fn get_request(url: &str) -> reqwest::Request {
    reqwest::Client::new()
        .get(url)
        .build()
        .expect("request builds")
}

/// A TCP server that drops the first `failures` connections, then
/// serves a minimal HTTP 200 to every later one.
async fn flaky_server(failures: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut seen = 0usize;
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            seen += 1;
            if seen <= failures {
                // Close before responding: the client sees a dead
                // connection mid-request.
                drop(socket);
                continue;
            }
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\n\r\n{}",
                )
                .await;
        }
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn consecutive_dispatches_are_spaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let pacing = PacingConfig {
        min_interval: Duration::from_millis(200),
        ..fast_pacing()
    };
    let transport = Transport::new(pacing, RunLog::disabled());
    let url = server.uri();

    let start = Instant::now();
    for _ in 0..3 {
        transport
            .dispatch("test.get", get_request(&url))
            .await
            .unwrap();
    }
    let elapsed = start.elapsed();

    // Two enforced gaps of >= 200ms each between three calls.
    assert!(
        elapsed >= Duration::from_millis(400),
        "three calls finished in {:?}",
        elapsed
    );
}

#[tokio::test]
async fn rate_limit_response_cools_down_and_retries() {
    let server = MockServer::start().await;

    // First request is rate-limited, every later one succeeds.
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log = RunLog::open_in(dir.path()).unwrap();
    let transport = Transport::new(fast_pacing(), log);

    let response = transport
        .dispatch("test.get", get_request(&server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);

    let contents = std::fs::read_to_string(transport.log().path().unwrap()).unwrap();
    let cooldowns = contents
        .lines()
        .filter(|l| l.contains("rate limit exceeded"))
        .count();
    assert_eq!(cooldowns, 1);
}

#[tokio::test]
async fn network_failures_exhaust_the_retry_budget() {
    // Every connection dies before a response.
    let url = flaky_server(usize::MAX).await;
    let transport = Transport::new(fast_pacing(), RunLog::disabled());

    let result = transport.dispatch("blocks.children.list", get_request(&url)).await;

    match result {
        Err(Error::RetriesExhausted {
            operation,
            attempts,
        }) => {
            assert_eq!(operation, "blocks.children.list");
            assert_eq!(attempts, 3);
        }
        other => panic!("expected RetriesExhausted, got {:?}", other.map(|r| r.status())),
    }
}

#[tokio::test]
async fn failures_below_the_budget_recover() {
    // Two dead connections, then a healthy one: under the cap of 3.
    let url = flaky_server(2).await;
    let transport = Transport::new(fast_pacing(), RunLog::disabled());

    let response = transport
        .dispatch("test.get", get_request(&url))
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn workspace_lists_databases() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                {"object": "database", "id": "db-1", "title": []},
                {"object": "database", "id": "db-2", "title": []}
            ],
            "has_more": false,
            "next_cursor": null
        })))
        .mount(&server)
        .await;

    let base = ApiUrl::new(server.uri()).unwrap();
    let workspace = HttpWorkspace::new(base, "test-token", fast_pacing(), RunLog::disabled());

    let page = workspace.list_databases(None).await.unwrap();

    assert_eq!(page.results.len(), 2);
    assert_eq!(page.has_more, Some(false));
    assert!(page.is_terminal());
    assert_eq!(page.results[0].id(), Some("db-1"));
}

#[tokio::test]
async fn workspace_surfaces_protocol_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/databases/bad-id"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "code": "object_not_found",
            "message": "Could not find database"
        })))
        .mount(&server)
        .await;

    let base = ApiUrl::new(server.uri()).unwrap();
    let workspace = HttpWorkspace::new(base, "test-token", fast_pacing(), RunLog::disabled());

    let id = tome_core::ObjectId::new("bad-id").unwrap();
    let err = workspace.retrieve_database(&id).await.unwrap_err();

    match err {
        Error::Protocol(protocol) => {
            assert_eq!(protocol.status, 404);
            assert_eq!(protocol.code.as_deref(), Some("object_not_found"));
        }
        other => panic!("expected protocol error, got {}", other),
    }
}

#[tokio::test]
async fn shared_transport_paces_across_clients() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [], "has_more": false
        })))
        .mount(&server)
        .await;

    let pacing = PacingConfig {
        min_interval: Duration::from_millis(150),
        ..fast_pacing()
    };
    let transport = Arc::new(Transport::new(pacing, RunLog::disabled()));
    let base = ApiUrl::new(server.uri()).unwrap();
    let a = HttpWorkspace::with_transport(base.clone(), "t", transport.clone());
    let b = HttpWorkspace::with_transport(base, "t", transport);

    let start = Instant::now();
    a.list_users(None).await.unwrap();
    b.list_users(None).await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(150));
}
