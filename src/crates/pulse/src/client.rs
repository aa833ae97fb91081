//! HTTP client for the Pulse API.
//!
//! [`PulseApi`] is the seam the agent tools are written against; [`PulseClient`]
//! is the reqwest implementation. Every call is sent exactly once.
//!
//! | Call | Request |
//! |---|---|
//! | semantics | `GET {base}/semantics` |
//! | raw query | `POST {base}/query` with `{"query": sql}` |
//! | endpoint | `POST {base}/endpoints/{name}/query` with `{"params", "page_size"}` |

use crate::config::PulseConfig;
use crate::error::{PulseError, Result};
use crate::query::{EndpointQueryParams, EndpointQueryResult, RawQueryResult};
use crate::semantics::Semantics;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

/// Header carrying the application id.
pub const APPLICATION_ID_HEADER: &str = "X-Pulse-Application-Id";

/// Operations the agent needs from the analytics backend.
#[async_trait]
pub trait PulseApi: Send + Sync {
    /// Fetch all cubes for the application.
    async fn fetch_semantics(&self) -> Result<Semantics>;

    /// Run ad hoc SQL.
    async fn raw_query(&self, sql: &str) -> Result<RawQueryResult>;

    /// Invoke an endpoint cube.
    async fn query_endpoint(&self, params: &EndpointQueryParams) -> Result<EndpointQueryResult>;
}

/// Which call a failed response belongs to; decides the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operation {
    Semantics,
    RawQuery,
    Endpoint,
}

#[derive(Serialize)]
struct RawQueryBody<'a> {
    query: &'a str,
}

#[derive(Serialize)]
struct EndpointBody<'a> {
    params: &'a serde_json::Map<String, JsonValue>,
    page_size: u32,
}

/// reqwest-backed [`PulseApi`].
#[derive(Clone)]
pub struct PulseClient {
    config: PulseConfig,
    client: Client,
}

impl PulseClient {
    /// Create a client. Fails on invalid configuration.
    pub fn new(config: PulseConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PulseError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// `{base}/endpoints/{name}/query` with `name` encoded as one path segment.
    fn endpoint_url(&self, endpoint_name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| PulseError::Config(format!("invalid base_url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| PulseError::Config("base_url cannot have path segments".to_string()))?
            .pop_if_empty()
            .extend(["endpoints", endpoint_name, "query"]);
        Ok(url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("Authorization", format!("Bearer {}", self.config.api_key))
            .header(APPLICATION_ID_HEADER, &self.config.application_id)
    }

    async fn send(&self, req: RequestBuilder, op: Operation) -> Result<Response> {
        let response = self.authorize(req).send().await.map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(?op, status = status.as_u16(), "Pulse request failed");
        Err(status_error(op, status, &body))
    }
}

#[async_trait]
impl PulseApi for PulseClient {
    async fn fetch_semantics(&self) -> Result<Semantics> {
        debug!(application_id = %self.config.application_id, "Fetching semantics");

        let req = self.client.get(self.url("/semantics"));
        let response = self.send(req, Operation::Semantics).await?;
        let payload: JsonValue = response
            .json()
            .await
            .map_err(|e| PulseError::RemoteFetch(format!("invalid JSON body: {}", e)))?;

        Semantics::from_value(payload)
    }

    async fn raw_query(&self, sql: &str) -> Result<RawQueryResult> {
        debug!(sql, "Executing raw query");

        let req = self
            .client
            .post(self.url("/query"))
            .json(&RawQueryBody { query: sql });
        let response = self.send(req, Operation::RawQuery).await?;

        response
            .json()
            .await
            .map_err(|e| PulseError::Serialization(format!("invalid query result: {}", e)))
    }

    async fn query_endpoint(&self, params: &EndpointQueryParams) -> Result<EndpointQueryResult> {
        debug!(
            endpoint = %params.endpoint_name,
            page_size = params.page_size,
            "Invoking endpoint"
        );

        let url = self.endpoint_url(&params.endpoint_name)?;
        let req = self.client.post(url).json(&EndpointBody {
            params: &params.params,
            page_size: params.page_size,
        });
        let response = self.send(req, Operation::Endpoint).await?;

        response
            .json()
            .await
            .map_err(|e| PulseError::Serialization(format!("invalid endpoint result: {}", e)))
    }
}

fn transport_error(err: reqwest::Error) -> PulseError {
    if err.is_connect() || err.is_timeout() {
        PulseError::Connection(err.to_string())
    } else {
        PulseError::Http(err)
    }
}

/// Pull a human-readable message out of an error body.
fn server_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<JsonValue>(body).ok().and_then(|v| {
        ["message", "error", "detail"]
            .iter()
            .find_map(|key| v.get(*key).and_then(JsonValue::as_str).map(str::to_string))
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => status.to_string(),
        None => body.trim().to_string(),
    }
}

pub(crate) fn status_error(op: Operation, status: StatusCode, body: &str) -> PulseError {
    let message = server_message(status, body);

    match (op, status.as_u16()) {
        (_, 401 | 403) => PulseError::Auth(message),
        (Operation::Endpoint, 404) => PulseError::EndpointNotFound(message),
        (Operation::Endpoint, 400 | 422) => PulseError::Parameter(message),
        (Operation::Endpoint, _) => PulseError::Query(message),
        (Operation::RawQuery, _) => PulseError::Query(message),
        (Operation::Semantics, _) => PulseError::RemoteFetch(message),
    }
}
