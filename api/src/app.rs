use axum::Router;

use crate::middleware::rate_limit;
use crate::routes;
use crate::state::AppState;

/// All API routes.
///
/// With `rate_limited`, endpoints that call the model or check passwords get
/// per-IP limits. The limiter keys on the peer address, so the router must
/// then be served with connect info.
pub fn router(rate_limited: bool) -> Router<AppState> {
    let mut ai = routes::generate::router().merge(routes::chat::message_router());
    let mut credentials = routes::users::auth_router();
    if rate_limited {
        ai = ai.layer(rate_limit::ai_layer());
        credentials = credentials.layer(rate_limit::auth_layer());
    }

    Router::new()
        .merge(routes::health::router())
        .merge(ai)
        .merge(credentials)
        .merge(routes::chat::router())
        .merge(routes::users::me_router())
}
