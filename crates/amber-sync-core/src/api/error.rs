use serde::Deserialize;
use thiserror::Error;

/// Result alias used by every fallible operation in the sync layer.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure taxonomy for reads and writes against the remote API.
///
/// `Conflict` is kept apart from every other failure: it means the version
/// the caller presented is no longer current, and the caller has to re-read
/// before trying again. Nothing in this crate retries automatically.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Version conflict - entity was changed by someone else (current version: {current_version:?})")]
    Conflict { current_version: Option<i32> },

    #[error("Validation failed: {code}{}", format_details(.details))]
    Validation {
        code: String,
        details: Option<String>,
    },

    #[error("Unauthorized - credential missing, invalid or expired ({code})")]
    Unauthorized { code: String },

    #[error("Access denied: {code}")]
    Forbidden { code: String },

    #[error("Resource not found: {code}")]
    NotFound { code: String },

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error {status}: {code}")]
    Server { status: u16, code: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request task was cancelled: {0}")]
    Cancelled(String),
}

fn format_details(details: &Option<String>) -> String {
    details
        .as_deref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error code used when the body carries none.
const UNKNOWN_ERROR: &str = "unknown_error";

/// Error body shape shared by every endpoint.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    current_version: Option<i32>,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Classify a non-success response from its status code and body.
    ///
    /// The body's `error` field wins over the status for conflicts, so a
    /// server that reports `version_conflict` with a 400 is still a conflict.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let code = parsed
            .error
            .clone()
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

        if status == 409 || code == "version_conflict" {
            return ApiError::Conflict {
                current_version: parsed.current_version,
            };
        }

        match status {
            400 | 422 => ApiError::Validation {
                code,
                details: parsed.details,
            },
            401 => ApiError::Unauthorized { code },
            403 => ApiError::Forbidden { code },
            404 => ApiError::NotFound { code },
            429 => ApiError::RateLimited,
            500..=599 => ApiError::Server { status, code },
            _ => ApiError::InvalidResponse(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            )),
        }
    }

    /// True when the write was rejected because the presented version is stale.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }

    /// True for credential and role failures; the UI should drop to read-only.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. } | ApiError::Forbidden { .. })
    }

    /// Hint for the UI whether offering a retry button makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::RateLimited | ApiError::Server { .. }
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::InvalidResponse(err.to_string())
    }
}
