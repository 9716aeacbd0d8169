use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use giftwise_core::error::{self, ApiError};
use giftwise_core::normalize::NormalizeError;

use crate::gemini::ModelError;
use crate::store::StoreError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Missing or malformed request input (400)
    Validation {
        message: String,
        field: Option<String>,
    },
    /// Missing or invalid credentials (401)
    Unauthorized { message: String },
    /// Unique constraint on user input, e.g. an email already registered (409)
    Conflict {
        message: String,
        field: Option<String>,
    },
    /// Model output failed normalization (500)
    Normalization(NormalizeError),
    /// The generative-language provider call failed (500)
    Upstream(ModelError),
    /// Database error (500)
    Database(sqlx::Error),
    /// Internal error (500)
    Internal(String),
}

impl AppError {
    /// Validation error listing absent request fields in the given order.
    pub fn missing_fields(fields: &[&str]) -> Self {
        AppError::Validation {
            message: format!("Missing required fields: {}", fields.join(", ")),
            field: Some(fields.join(",")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation { message, field } => {
                let mut body = ApiError::new(error::codes::VALIDATION_FAILED, message, request_id);
                body.field = field;
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                ApiError::new(error::codes::UNAUTHORIZED, message, request_id),
            ),
            AppError::Conflict { message, field } => {
                let mut body = ApiError::new(error::codes::CONFLICT, message, request_id);
                body.field = field;
                (StatusCode::CONFLICT, body)
            }
            AppError::Normalization(err) => {
                tracing::warn!(kind = err.kind(), error = %err, %request_id, "Model output rejected");
                let mut body = ApiError::new(
                    error::codes::NORMALIZATION_FAILED,
                    "Failed to process recommendations",
                    request_id,
                );
                body.details = Some(err.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            AppError::Upstream(err) => {
                tracing::error!(error = %err, %request_id, "Model request failed");
                let mut body = ApiError::new(
                    error::codes::UPSTREAM_ERROR,
                    "Failed to get a response from the AI provider",
                    request_id,
                );
                body.details = Some(err.to_string());
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            AppError::Database(err) => {
                tracing::error!(%request_id, "Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new(
                        error::codes::INTERNAL_ERROR,
                        "An internal error occurred",
                        request_id,
                    ),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(%request_id, "Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new(
                        error::codes::INTERNAL_ERROR,
                        "An internal error occurred",
                        request_id,
                    ),
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<NormalizeError> for AppError {
    fn from(err: NormalizeError) -> Self {
        AppError::Normalization(err)
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::Upstream(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => AppError::Database(e),
            StoreError::DuplicateEmail(email) => AppError::Conflict {
                message: format!("User with email '{email}' already exists"),
                field: Some("email".to_string()),
            },
            StoreError::Corrupt(msg) => AppError::Internal(msg),
        }
    }
}
