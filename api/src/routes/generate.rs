use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use giftwise_core::normalize::normalize_response;
use giftwise_core::recommendations::{GenerateResponse, GiftPreferences};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::prompts::recommendation_prompt;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/generate", post(generate))
}

/// Generate gift recommendations for a completed questionnaire.
///
/// Runs validate → prompt → model → normalize → persist. Nothing is stored
/// unless normalization succeeds.
#[utoipa::path(
    post,
    path = "/api/generate",
    request_body = GiftPreferences,
    responses(
        (status = 200, description = "Recommendations generated and stored", body = GenerateResponse),
        (status = 400, description = "Missing questionnaire fields", body = giftwise_core::error::ApiError),
        (status = 500, description = "Model call or normalization failed", body = giftwise_core::error::ApiError)
    ),
    tag = "recommendations"
)]
pub async fn generate(
    State(state): State<AppState>,
    AppJson(preferences): AppJson<GiftPreferences>,
) -> Result<Json<GenerateResponse>, AppError> {
    let questionnaire = preferences
        .into_questionnaire()
        .map_err(|missing| AppError::missing_fields(&missing))?;

    let raw = state
        .model
        .generate(&recommendation_prompt(&questionnaire))
        .await?;
    let normalized = normalize_response(&raw).inspect_err(|err| {
        tracing::debug!(kind = err.kind(), raw = %raw, "Unusable model output");
    })?;
    let recommendations = state.store.insert_recommendations(normalized).await?;

    tracing::info!(
        count = recommendations.len(),
        occasion = %questionnaire.occasion,
        "Stored recommendations"
    );

    Ok(Json(GenerateResponse {
        success: true,
        recommendations,
    }))
}
