//! Transport seam between the sync layer and the HTTP client.
//!
//! Executors only ever see [`ApiRequest`] values and JSON responses, so tests
//! can swap the reqwest-backed [`ApiClient`](super::ApiClient) for an
//! in-memory server.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use super::ApiResult;

/// HTTP verbs used by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// Route prefix of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Read endpoints available to every authenticated viewer
    Public,
    /// Write and admin endpoints, organizer role or higher
    Private,
}

impl Access {
    pub fn prefix(&self) -> &'static str {
        match self {
            Access::Public => "/public",
            Access::Private => "/private",
        }
    }
}

/// A single request against the API, independent of the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub access: Access,
    /// Path below the access prefix, e.g. `/teams/7/members`
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(access: Access, path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            access,
            path: path.into(),
            body: None,
        }
    }

    pub fn write(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            access: Access::Private,
            path: path.into(),
            body: Some(body),
        }
    }

    /// Prefixed path, e.g. `/private/teams/7`
    pub fn full_path(&self) -> String {
        format!("{}{}", self.access.prefix(), self.path)
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.full_path())
    }
}

/// Executes requests against the remote API.
///
/// Implementations return the decoded JSON body for 2xx responses and a
/// classified [`ApiError`](super::ApiError) for everything else.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> ApiResult<Value>;
}
