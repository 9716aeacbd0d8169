use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod app;
mod auth;
mod config;
mod error;
mod extract;
mod gemini;
mod middleware;
mod prompts;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Giftwise API",
        version = "0.1.0",
        description = "Gift recommendations from a short questionnaire, plus a chat assistant that remembers each session."
    ),
    paths(
        routes::health::health_check,
        routes::generate::generate,
        routes::chat::send_message,
        routes::chat::history,
        routes::chat::sessions,
        routes::chat::clear_session,
        routes::users::signup,
        routes::users::login,
        routes::users::me,
    ),
    components(schemas(
        HealthResponse,
        giftwise_core::error::ApiError,
        giftwise_core::recommendations::GiftPreferences,
        giftwise_core::recommendations::Recommendation,
        giftwise_core::recommendations::GenerateResponse,
        giftwise_core::chat::Sender,
        giftwise_core::chat::GiftContext,
        giftwise_core::chat::ChatMessageRequest,
        giftwise_core::chat::ChatMessageResponse,
        giftwise_core::chat::ChatHistoryEntry,
        giftwise_core::chat::ChatHistoryResponse,
        giftwise_core::chat::SessionSummary,
        giftwise_core::chat::ChatSessionsResponse,
        giftwise_core::chat::SessionClearedResponse,
        routes::users::SignupRequest,
        routes::users::SignupResponse,
        routes::users::LoginRequest,
        routes::users::LoginResponse,
        routes::users::MeResponse,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "giftwise_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let model = gemini::GeminiClient::new(&config.gemini).expect("Failed to build model client");
    tracing::info!(model = model.model(), "Model client ready");

    let app_state = state::AppState::new(
        Arc::new(store::PgStore::new(pool.clone())),
        Arc::new(model),
    );

    if !config.rate_limit {
        tracing::warn!("Rate limiting disabled (GIFTWISE_RATE_LIMIT=false)");
    }

    let app = app::router(config.rate_limit)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::build_cors_layer(&config.cors_origins)),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Giftwise API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    pool.close().await;
    tracing::info!("Shut down cleanly");
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
