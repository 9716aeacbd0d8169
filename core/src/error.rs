use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform error body returned by every endpoint.
///
/// `success` is always `false`. `error` is readable on its own; `code` is the
/// stable machine identifier to branch on.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always false
    pub success: bool,
    /// Human-readable description of what went wrong
    pub error: String,
    /// Machine-readable error code (e.g. "validation_failed", "upstream_error")
    pub code: String,
    /// Underlying cause, when it is safe to expose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Request ID for correlating with server logs
    pub request_id: String,
}

impl ApiError {
    pub fn new(code: &str, error: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.to_string(),
            details: None,
            field: None,
            request_id: request_id.into(),
        }
    }
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const CONFLICT: &str = "conflict";
    pub const NORMALIZATION_FAILED: &str = "normalization_failed";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const RATE_LIMITED: &str = "rate_limited";
}
