//! Request and result types for Pulse queries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Rows returned per page unless the caller asks otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Parameters for invoking an endpoint cube.
///
/// ```json
/// {"endpoint_name": "sales", "params": {"region": "EU"}, "page_size": 100}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointQueryParams {
    pub endpoint_name: String,

    #[serde(default)]
    pub params: Map<String, JsonValue>,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl EndpointQueryParams {
    pub fn new(endpoint_name: impl Into<String>) -> Self {
        Self {
            endpoint_name: endpoint_name.into(),
            params: Map::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// One page of an endpoint invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointQueryResult {
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub page_size: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub rows: Vec<JsonValue>,
}

/// Result of a raw SQL query.
///
/// Fields besides `rows` are kept as sent by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQueryResult {
    #[serde(default)]
    pub rows: Vec<JsonValue>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl RawQueryResult {
    pub fn from_rows(rows: Vec<JsonValue>) -> Self {
        Self {
            rows,
            extra: Map::new(),
        }
    }
}
