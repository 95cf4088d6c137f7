//! The transport seam between stores and the backend API.

use async_trait::async_trait;
use serde_json::Value;

use super::ApiError;

/// A decoded HTTP response: status code plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub data: Value,
}

impl HttpResponse {
    pub fn ok(data: Value) -> Self {
        Self { status: 200, data }
    }
}

/// Backend transport used by store modules.
///
/// Paths are relative to the connector's configured base URL,
/// e.g. `/gw/geofences`.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn get(&self, path: &str) -> Result<HttpResponse, ApiError>;
}
