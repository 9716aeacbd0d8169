use axum::http::{HeaderValue, Response, StatusCode};
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
};

use giftwise_core::error::{ApiError, codes};

type RateLimitLayer =
    GovernorLayer<SmartIpKeyExtractor, governor::middleware::NoOpMiddleware, axum::body::Body>;

/// Rate limit for endpoints that call the model: 20 requests per minute per IP.
pub fn ai_layer() -> RateLimitLayer {
    GovernorLayer::new(
        GovernorConfigBuilder::default()
            .per_second(3) // one token every 3s = 20 per minute
            .burst_size(5)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("invalid governor config for ai"),
    )
    .error_handler(json_error_handler)
}

/// Rate limit for signup and login: 10 requests per minute per IP.
pub fn auth_layer() -> RateLimitLayer {
    GovernorLayer::new(
        GovernorConfigBuilder::default()
            .per_second(6)
            .burst_size(5)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("invalid governor config for auth"),
    )
    .error_handler(json_error_handler)
}

/// Returns the uniform error body with a Retry-After header.
fn json_error_handler(err: GovernorError) -> Response<axum::body::Body> {
    let (status, retry_after, message) = match err {
        GovernorError::TooManyRequests { wait_time, .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            Some(wait_time),
            format!("Too many requests. Retry after {wait_time} seconds."),
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            "Unable to determine client identity for rate limiting".to_string(),
        ),
        GovernorError::Other { code, msg, .. } => (code, None, msg.unwrap_or_default()),
    };

    let body = ApiError::new(codes::RATE_LIMITED, message, uuid::Uuid::now_v7().to_string());
    let mut response = Response::new(axum::body::Body::from(
        serde_json::to_string(&body).unwrap_or_default(),
    ));
    *response.status_mut() = status;
    response.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("application/json"),
    );
    if let Some(seconds) = retry_after {
        response
            .headers_mut()
            .insert("retry-after", HeaderValue::from(seconds));
    }

    response
}
