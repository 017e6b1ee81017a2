//! Rate-limited transport.
//!
//! Every outbound request goes through one [`Transport`] instance, which
//! guarantees a minimum interval between dispatches across all call
//! sites, converts 429 responses into cooldown-and-retry, and retries
//! network-level failures up to a configurable cap. The remote budget
//! is on the order of 3 requests per second, and a full-corpus backup
//! can run for hours; absorbing transient failures here keeps every
//! caller simple.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use tome_core::{Error, Result};

/// Extra slack added on top of the computed pacing delay.
const PACING_MARGIN: Duration = Duration::from_millis(10);

/// Pacing and retry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingConfig {
    /// Minimum spacing between two outbound calls.
    pub min_interval: Duration,
    /// Cooldown after a 429 response. Retries after 429 are unbounded.
    pub rate_limit_cooldown: Duration,
    /// Cooldown after a network-level failure.
    pub error_cooldown: Duration,
    /// Cap on consecutive network-failure retries.
    pub max_retries: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            // 3 requests/second budget, with headroom.
            min_interval: Duration::from_millis(335),
            rate_limit_cooldown: Duration::from_secs(5 * 60),
            error_cooldown: Duration::from_secs(60),
            max_retries: 5,
        }
    }
}

/// Append-only per-run diagnostic log.
///
/// Records every attempt, status code, and cooldown independently of
/// console verbosity. Log writes never fail a request; errors are
/// swallowed after a debug trace.
#[derive(Debug)]
pub struct RunLog {
    file: Option<StdMutex<File>>,
    path: Option<PathBuf>,
}

impl RunLog {
    /// Open a new timestamped log file in `dir`, creating the directory
    /// if needed.
    pub fn open_in(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let name = format!("tome_api_{}.log", Utc::now().format("%Y%m%dT%H%M%S%f"));
        let path = dir.join(name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        Ok(Self {
            file: Some(StdMutex::new(file)),
            path: Some(path),
        })
    }

    /// A log that discards everything.
    pub fn disabled() -> Self {
        Self {
            file: None,
            path: None,
        }
    }

    /// The log file path, if logging is enabled.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one timestamped line.
    pub fn write(&self, message: &str) {
        if let Some(file) = &self.file {
            let mut file = match file.lock() {
                Ok(f) => f,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Err(e) = writeln!(file, "{} - {}", Utc::now().to_rfc3339(), message) {
                debug!(error = %e, "run log write failed");
            }
        }
    }
}

/// Rate-limited request dispatcher.
///
/// Wraps a reqwest client so that no two dispatches start less than
/// `min_interval` apart, and transient failure classes are retried
/// instead of surfacing to callers.
#[derive(Debug)]
pub struct Transport {
    http: reqwest::Client,
    pacing: PacingConfig,
    last_dispatch: Mutex<Option<Instant>>,
    log: RunLog,
}

impl Transport {
    /// Create a new transport with the given pacing config and run log.
    pub fn new(pacing: PacingConfig, log: RunLog) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tome/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            pacing,
            last_dispatch: Mutex::new(None),
            log,
        }
    }

    /// The active pacing configuration.
    pub fn pacing(&self) -> &PacingConfig {
        &self.pacing
    }

    /// The diagnostic run log.
    pub fn log(&self) -> &RunLog {
        &self.log
    }

    /// The underlying HTTP client, for building requests.
    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Dispatch a request, pacing and retrying as needed.
    ///
    /// Returns the response for any HTTP status other than 429; parsing
    /// non-success statuses is the caller's concern. 429 responses are
    /// retried after `rate_limit_cooldown` without bound. Network-level
    /// failures are retried after `error_cooldown` up to `max_retries`
    /// times, after which [`Error::RetriesExhausted`] names the
    /// operation and the attempt count.
    pub async fn dispatch(
        &self,
        operation: &str,
        request: reqwest::Request,
    ) -> Result<reqwest::Response> {
        let mut attempts: u32 = 0;

        loop {
            let req = request.try_clone().ok_or_else(|| {
                Error::InvalidInput(tome_core::error::InvalidInputError::Other {
                    message: format!("request body for '{}' is not replayable", operation),
                })
            })?;

            self.pace().await;
            self.log
                .write(&format!("{}: {} {}", operation, req.method(), req.url()));

            match self.http.execute(req).await {
                Ok(response) => {
                    let status = response.status();
                    self.log.write(&format!("{}: HTTP {}", operation, status));

                    if status.as_u16() == 429 {
                        warn!(
                            operation,
                            cooldown_secs = self.pacing.rate_limit_cooldown.as_secs(),
                            "rate limit exceeded, cooling down"
                        );
                        self.log.write(&format!(
                            "{}: rate limit exceeded, cooling down for {}s",
                            operation,
                            self.pacing.rate_limit_cooldown.as_secs()
                        ));
                        sleep(self.pacing.rate_limit_cooldown).await;
                        self.log.write(&format!("{}: retrying after rate limit", operation));
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    attempts += 1;
                    warn!(
                        operation,
                        attempts,
                        max_retries = self.pacing.max_retries,
                        error = %err,
                        "request failed"
                    );
                    self.log.write(&format!(
                        "{}: request error (attempt {}/{}): {}",
                        operation, attempts, self.pacing.max_retries, err
                    ));

                    if attempts >= self.pacing.max_retries {
                        self.log.write(&format!(
                            "{}: retries exhausted after {} attempts",
                            operation, attempts
                        ));
                        return Err(Error::RetriesExhausted {
                            operation: operation.to_string(),
                            attempts,
                        });
                    }

                    sleep(self.pacing.error_cooldown).await;
                }
            }
        }
    }

    /// Suspend until at least `min_interval` has passed since the last
    /// dispatch, then claim the dispatch slot. The lock is held across
    /// the sleep so concurrent callers queue up rather than racing.
    async fn pace(&self) {
        let mut last = self.last_dispatch.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.pacing.min_interval {
                sleep(self.pacing.min_interval - elapsed + PACING_MARGIN).await;
            }
        }
        *last = Some(Instant::now());
    }
}
