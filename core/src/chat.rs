use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::recommendations::{GiftPreferences, Recommendation};

/// Session previews longer than this many characters are cut and suffixed with `...`.
pub const SESSION_PREVIEW_CHARS: usize = 100;
/// Maximum number of sessions returned by [`summarize_sessions`].
pub const MAX_SESSION_SUMMARIES: usize = 20;
/// Default and upper bound for `GET /api/chat/history/{session_id}`.
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 200;
/// How many prior messages of a session are fed back into the chat prompt.
pub const PROMPT_CONTEXT_MESSAGES: i64 = 10;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "assistant" => Ok(Sender::Assistant),
            other => Err(format!("unknown chat sender '{other}'")),
        }
    }
}

/// Gift-related context attached to a chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GiftContext {
    /// IDs of recommendations produced by this turn
    #[serde(default)]
    pub recommendations: Vec<Uuid>,
    /// Preferences the user supplied with this turn
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_preferences: Option<GiftPreferences>,
}

/// A single message in a chat session. Immutable once written;
/// removed only when the whole session is cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// Message ID (UUIDv7, time-sortable)
    pub id: Uuid,
    pub session_id: String,
    pub user_id: String,
    pub message: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub gift_context: Option<GiftContext>,
}

impl ChatMessage {
    pub fn new(
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        message: impl Into<String>,
        sender: Sender,
        gift_context: Option<GiftContext>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            message: message.into(),
            sender,
            timestamp: Utc::now(),
            gift_context,
        }
    }
}

/// Request body for `POST /api/chat/message`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Optional questionnaire answers to steer the assistant
    #[serde(default)]
    pub preferences: Option<GiftPreferences>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageResponse {
    pub success: bool,
    /// The assistant's reply, verbatim
    pub response: String,
    /// ID of the stored assistant message
    pub message_id: Uuid,
    /// Present when the reply parsed as a recommendation list
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Recommendation>,
}

/// One message as shown in a session's history.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatHistoryEntry {
    pub id: Uuid,
    pub message: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub gift_context: Option<GiftContext>,
}

impl From<ChatMessage> for ChatHistoryEntry {
    fn from(msg: ChatMessage) -> Self {
        Self {
            id: msg.id,
            message: msg.message,
            sender: msg.sender,
            timestamp: msg.timestamp,
            gift_context: msg.gift_context,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatHistoryResponse {
    pub success: bool,
    pub messages: Vec<ChatHistoryEntry>,
}

/// Overview of one chat session for a session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    /// Last message, cut to 100 characters
    pub last_message: String,
    pub last_timestamp: DateTime<Utc>,
    pub message_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatSessionsResponse {
    pub success: bool,
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionClearedResponse {
    pub success: bool,
    pub message: String,
    /// Number of messages removed
    pub deleted: u64,
}

/// Cut `message` to [`SESSION_PREVIEW_CHARS`] characters, appending `...` when cut.
pub fn session_preview(message: &str) -> String {
    match message.char_indices().nth(SESSION_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

/// Group a user's messages into session summaries.
///
/// `messages` must be in timestamp-ascending order; the last message seen for
/// a session is its preview. Sessions come back most recent first, capped at
/// [`MAX_SESSION_SUMMARIES`].
pub fn summarize_sessions<'a, I>(messages: I) -> Vec<SessionSummary>
where
    I: IntoIterator<Item = &'a ChatMessage>,
{
    let mut by_session: HashMap<&str, (&ChatMessage, i64)> = HashMap::new();
    for msg in messages {
        by_session
            .entry(msg.session_id.as_str())
            .and_modify(|(last, count)| {
                *last = msg;
                *count += 1;
            })
            .or_insert((msg, 1));
    }

    let mut sessions: Vec<SessionSummary> = by_session
        .into_iter()
        .map(|(session_id, (last, count))| SessionSummary {
            session_id: session_id.to_string(),
            last_message: session_preview(&last.message),
            last_timestamp: last.timestamp,
            message_count: count,
        })
        .collect();

    sessions.sort_by(|a, b| {
        b.last_timestamp
            .cmp(&a.last_timestamp)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    sessions.truncate(MAX_SESSION_SUMMARIES);
    sessions
}

/// Resolve a requested history limit.
///
/// Absent means `DEFAULT_HISTORY_LIMIT`; values above `MAX_HISTORY_LIMIT` are
/// capped. Returns `None` for values below 1.
pub fn history_limit(requested: Option<i64>) -> Option<i64> {
    match requested {
        None => Some(DEFAULT_HISTORY_LIMIT),
        Some(limit) if limit < 1 => None,
        Some(limit) => Some(limit.min(MAX_HISTORY_LIMIT)),
    }
}
