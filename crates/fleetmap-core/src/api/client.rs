//! API client for communicating with the fleet-tracking REST gateway.
//!
//! `ApiClient` is the production `Connector`: it owns a pooled reqwest
//! client, a base URL and an optional access token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::debug;

use super::{ApiError, Connector, HttpResponse};
use crate::config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the gateway
pub const DEFAULT_BASE_URL: &str = "https://flespi.io";

/// HTTP request timeout in seconds.
/// Geofence collections are small; 30s only trips on a stalled gateway.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// API client for the fleet-tracking gateway.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client against the default gateway
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client for a specific gateway, e.g. a local mock server
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Build a client from the loaded configuration
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let mut client = Self::with_base_url(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        if let Some(ref token) = config.token {
            client.set_token(token.clone());
        }
        Ok(client)
    }

    /// Set the access token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("FlespiToken {}", token))
                .map_err(|e| ApiError::InvalidResponse(format!("Invalid token header: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl Connector for ApiClient {
    async fn get(&self, path: &str) -> Result<HttpResponse, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let status = response.status().as_u16();

        let text = response.text().await?;
        let data: Value = serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })?;

        Ok(HttpResponse { status, data })
    }
}
