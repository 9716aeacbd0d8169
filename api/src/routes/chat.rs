use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;

use giftwise_core::chat::{
    ChatHistoryResponse, ChatMessage, ChatMessageRequest, ChatMessageResponse,
    ChatSessionsResponse, GiftContext, MAX_SESSION_SUMMARIES, PROMPT_CONTEXT_MESSAGES, Sender,
    SessionClearedResponse, history_limit,
};
use giftwise_core::normalize::normalize_response;
use giftwise_core::recommendations::Recommendation;

use crate::error::AppError;
use crate::extract::{AppJson, AppQuery};
use crate::prompts::chat_prompt;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/chat/history/{session_id}", get(history))
        .route("/api/chat/sessions/{user_id}", get(sessions))
        .route("/api/chat/session/{session_id}", delete(clear_session))
}

/// The message endpoint calls the model and is rate limited separately.
pub fn message_router() -> Router<AppState> {
    Router::new().route("/api/chat/message", post(send_message))
}

// ──────────────────────────────────────────────
// POST /api/chat/message
// ──────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/chat/message",
    request_body = ChatMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatMessageResponse),
        (status = 400, description = "Missing sessionId, userId or message", body = giftwise_core::error::ApiError),
        (status = 500, description = "Model call or persistence failed", body = giftwise_core::error::ApiError)
    ),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<AppState>,
    AppJson(req): AppJson<ChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, AppError> {
    let session_id = req.session_id.filter(|v| !v.trim().is_empty());
    let user_id = req.user_id.filter(|v| !v.trim().is_empty());
    let text = req.message.filter(|v| !v.trim().is_empty());
    let missing: Vec<&str> = [
        ("sessionId", &session_id),
        ("userId", &user_id),
        ("message", &text),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_none())
    .map(|(name, _)| name)
    .collect();
    let (Some(session_id), Some(user_id), Some(text)) = (session_id, user_id, text) else {
        return Err(AppError::missing_fields(&missing));
    };

    let preferences = req.preferences.filter(|p| !p.is_empty());
    let user_context = preferences.clone().map(|prefs| GiftContext {
        recommendations: Vec::new(),
        user_preferences: Some(prefs),
    });
    let user_message = ChatMessage::new(&session_id, &user_id, &text, Sender::User, user_context);
    state.store.insert_message(&user_message).await?;

    let history = state
        .store
        .recent_messages(&session_id, PROMPT_CONTEXT_MESSAGES)
        .await?;
    let reply = state
        .model
        .generate(&chat_prompt(preferences.as_ref(), &history, &text))
        .await?;

    let recommendations = store_reply_recommendations(&state, &reply).await?;
    let assistant_context = (!recommendations.is_empty()).then(|| GiftContext {
        recommendations: recommendations.iter().map(|rec| rec.id).collect(),
        user_preferences: None,
    });
    let assistant_message = ChatMessage::new(
        session_id,
        user_id,
        reply,
        Sender::Assistant,
        assistant_context,
    );
    state.store.insert_message(&assistant_message).await?;

    tracing::info!(
        session_id = %assistant_message.session_id,
        recommendations = recommendations.len(),
        "Chat turn completed"
    );

    Ok(Json(ChatMessageResponse {
        success: true,
        message_id: assistant_message.id,
        response: assistant_message.message,
        recommendations,
    }))
}

/// Persist recommendations carried by a chat reply. A reply that is plain
/// conversation yields none.
async fn store_reply_recommendations(
    state: &AppState,
    reply: &str,
) -> Result<Vec<Recommendation>, AppError> {
    match normalize_response(reply) {
        Ok(normalized) => Ok(state.store.insert_recommendations(normalized).await?),
        Err(err) => {
            tracing::debug!(kind = err.kind(), "Chat reply carries no recommendations");
            Ok(Vec::new())
        }
    }
}

// ──────────────────────────────────────────────
// GET /api/chat/history/{session_id}
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// Maximum number of messages (default 50, at most 200)
    #[serde(default)]
    pub limit: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/chat/history/{session_id}",
    params(
        ("session_id" = String, Path, description = "Chat session ID"),
        HistoryParams
    ),
    responses(
        (status = 200, description = "Earliest messages of the session, oldest first", body = ChatHistoryResponse),
        (status = 400, description = "Invalid limit", body = giftwise_core::error::ApiError)
    ),
    tag = "chat"
)]
pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    AppQuery(params): AppQuery<HistoryParams>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let limit = history_limit(params.limit).ok_or_else(|| AppError::Validation {
        message: "limit must be a positive integer".to_string(),
        field: Some("limit".to_string()),
    })?;
    let messages = state.store.session_history(&session_id, limit).await?;

    Ok(Json(ChatHistoryResponse {
        success: true,
        messages: messages.into_iter().map(Into::into).collect(),
    }))
}

// ──────────────────────────────────────────────
// GET /api/chat/sessions/{user_id}
// ──────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/chat/sessions/{user_id}",
    params(("user_id" = String, Path, description = "User whose sessions to list")),
    responses(
        (status = 200, description = "Most recent sessions first, at most 20", body = ChatSessionsResponse)
    ),
    tag = "chat"
)]
pub async fn sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ChatSessionsResponse>, AppError> {
    let sessions = state
        .store
        .session_summaries(&user_id, MAX_SESSION_SUMMARIES)
        .await?;

    Ok(Json(ChatSessionsResponse {
        success: true,
        sessions,
    }))
}

// ──────────────────────────────────────────────
// DELETE /api/chat/session/{session_id}
// ──────────────────────────────────────────────

#[utoipa::path(
    delete,
    path = "/api/chat/session/{session_id}",
    params(("session_id" = String, Path, description = "Chat session ID")),
    responses(
        (status = 200, description = "Session cleared", body = SessionClearedResponse)
    ),
    tag = "chat"
)]
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionClearedResponse>, AppError> {
    let deleted = state.store.delete_session(&session_id).await?;
    tracing::info!(%session_id, deleted, "Chat session cleared");

    Ok(Json(SessionClearedResponse {
        success: true,
        message: "Chat session cleared successfully".to_string(),
        deleted,
    }))
}
