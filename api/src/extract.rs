//! Custom extractors that convert axum rejections to structured AppError responses.
//!
//! Use `AppJson<T>` and `AppQuery<T>` in place of `axum::Json<T>` and
//! `axum::extract::Query<T>`. Deserialization failures produce a JSON
//! `AppError` instead of axum's default plain-text responses.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::request::Parts,
};

use crate::error::AppError;

/// JSON extractor that converts deserialization errors to `AppError::Validation`.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

/// Query-string extractor with the same error mapping as [`AppJson`].
pub struct AppQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(AppQuery(value)),
            Err(rejection) => {
                let body_text = rejection.body_text();
                Err(AppError::Validation {
                    message: format!("Invalid query string: {body_text}"),
                    field: extract_field_from_serde_message(&body_text),
                })
            }
        }
    }
}

/// Convert a `JsonRejection` to a structured `AppError::Validation`.
pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();

    // "missing field `timestamp`" → field = "timestamp"
    // "unknown field `foo`" → field = "foo"
    let field_hint = extract_field_from_serde_message(&body_text);

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field_hint.unwrap_or("body".to_string())),
    }
}

/// Try to extract a field name from serde's error messages.
fn extract_field_from_serde_message(msg: &str) -> Option<String> {
    for pattern in ["missing field `", "unknown field `"] {
        let Some(start) = msg.find(pattern) else {
            continue;
        };
        let after = &msg[start + pattern.len()..];
        if let Some(end) = after.find('`') {
            return Some(after[..end].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use serde::Deserialize;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn extracts_missing_field_name() {
        let msg = "Failed to deserialize: missing field `timestamp` at line 1 column 72";
        assert_eq!(
            extract_field_from_serde_message(msg),
            Some("timestamp".to_string())
        );
    }

    #[test]
    fn extracts_unknown_field_name() {
        let msg = "unknown field `foo`, expected one of `bar`, `baz`";
        assert_eq!(
            extract_field_from_serde_message(msg),
            Some("foo".to_string())
        );
    }

    #[test]
    fn returns_none_for_generic_error() {
        let msg = "invalid type: string, expected u64";
        assert_eq!(extract_field_from_serde_message(msg), None);
    }

    #[derive(Deserialize)]
    struct Limit {
        limit: Option<i64>,
    }

    async fn limit_handler(AppQuery(query): AppQuery<Limit>) -> String {
        query.limit.unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn non_numeric_query_value_is_a_validation_error() {
        let app: Router = Router::new().route("/", get(limit_handler));
        let response = app
            .oneshot(Request::get("/?limit=ten").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "validation_failed");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn malformed_json_body_is_a_validation_error() {
        async fn echo(AppJson(value): AppJson<serde_json::Value>) -> String {
            value.to_string()
        }
        let app: Router = Router::new().route("/", axum::routing::post(echo));
        let response = app
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
