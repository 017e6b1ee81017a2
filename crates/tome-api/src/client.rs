//! HTTP API client.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use tome_core::error::{Error, ProtocolError, TransportError};
use tome_core::types::ApiUrl;

use crate::transport::Transport;

/// Error body shape returned by the remote service.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub(crate) fn map_reqwest(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}

/// HTTP client for the workspace API.
///
/// Every request is dispatched through the shared rate-limited
/// [`Transport`], so all call sites observe one pacing budget.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: ApiUrl,
    token: String,
    transport: Arc<Transport>,
}

impl ApiClient {
    /// Create a new API client for the given base URL and bearer token.
    pub fn new(base: ApiUrl, token: impl Into<String>, transport: Arc<Transport>) -> Self {
        Self {
            base,
            token: token.into(),
            transport,
        }
    }

    /// Returns the base URL this client is configured for.
    pub fn base(&self) -> &ApiUrl {
        &self.base
    }

    /// Make a GET request with optional query parameters.
    #[instrument(skip(self, params), fields(base = %self.base))]
    pub async fn get<Q, R>(&self, operation: &str, path: &str, params: Option<&Q>) -> Result<R, Error>
    where
        Q: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.base.endpoint(path);
        debug!(operation, "API query");
        trace!(?params, "query parameters");

        let mut builder = self
            .transport
            .client()
            .get(&url)
            .headers(self.auth_headers());
        if let Some(params) = params {
            builder = builder.query(params);
        }

        self.send(operation, builder).await
    }

    /// Make a POST request with a JSON body.
    #[instrument(skip(self, body), fields(base = %self.base))]
    pub async fn post<B, R>(&self, operation: &str, path: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.base.endpoint(path);
        debug!(operation, "API procedure");

        let builder = self
            .transport
            .client()
            .post(&url)
            .headers(self.auth_headers())
            .json(body);

        self.send(operation, builder).await
    }

    /// Make a PATCH request with a JSON body.
    #[instrument(skip(self, body), fields(base = %self.base))]
    pub async fn patch<B, R>(&self, operation: &str, path: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.base.endpoint(path);
        debug!(operation, "API update");

        let builder = self
            .transport
            .client()
            .request(Method::PATCH, &url)
            .headers(self.auth_headers())
            .json(body);

        self.send(operation, builder).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        operation: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<R, Error> {
        let request = builder.build().map_err(map_reqwest)?;
        let response = self.transport.dispatch(operation, request).await?;
        self.handle_response(response).await
    }

    /// Create authorization headers for requests.
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", self.token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).expect("invalid token characters"),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Handle a response, parsing the body or error.
    async fn handle_response<R: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<R, Error> {
        let status = response.status();
        trace!(status = %status, "API response");

        if status.is_success() {
            let body = response.json::<R>().await.map_err(map_reqwest)?;
            Ok(body)
        } else {
            let error = self.parse_error_response(response).await;
            Err(Error::Protocol(error))
        }
    }

    /// Parse an error response, surfacing status and body.
    async fn parse_error_response(&self, response: reqwest::Response) -> ProtocolError {
        let status = response.status().as_u16();

        match response.json::<ApiErrorResponse>().await {
            Ok(body) => ProtocolError::new(status, body.code, body.message),
            Err(_) => ProtocolError::new(status, None, None),
        }
    }
}
