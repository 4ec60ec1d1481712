//! API client for the tournament-records REST API.
//!
//! This module provides the `ApiClient` struct, the reqwest-backed
//! [`Transport`] used outside of tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::Credential;
use crate::config::Config;

use super::transport::{ApiRequest, Method, Transport};
use super::{ApiError, ApiResult};

/// API client for the records service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth_scheme: String,
    credential: Option<Credential>,
}

impl ApiClient {
    /// Create a new API client from configuration
    pub fn new(config: &Config) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            auth_scheme: config.auth_scheme.clone(),
            credential: None,
        })
    }

    /// Set the credential for authenticated requests
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    /// Create a new ApiClient with the given credential, sharing the connection pool.
    pub fn with_credential(&self, credential: Credential) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            auth_scheme: self.auth_scheme.clone(),
            credential: Some(credential),
        }
    }

    fn url(&self, request: &ApiRequest) -> String {
        format!("{}{}", self.base_url, request.full_path())
    }

    fn auth_headers(&self) -> ApiResult<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref credential) = self.credential {
            let value = format!("{} {}", self.auth_scheme, credential.expose());
            let value = header::HeaderValue::from_str(&value).map_err(|_| ApiError::Unauthorized {
                code: "invalid_authorization_format".to_string(),
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning a classified error with body if not.
    async fn check_response(response: reqwest::Response) -> ApiResult<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_response(status.as_u16(), &body))
        }
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value> {
        let url = self.url(&request);
        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };

        let mut builder = builder
            .headers(self.auth_headers()?)
            .header(header::ACCEPT, "application/json");
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        debug!(request = %request, "Sending API request");
        let response = builder.send().await.map_err(|e| {
            warn!(request = %request, error = %e, "API request failed to complete");
            ApiError::from(e)
        })?;

        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
