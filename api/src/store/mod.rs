//! Persistence for recommendations, chat messages and accounts.
//!
//! Handlers only see the [`Store`] trait; [`PgStore`] is the production
//! implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use giftwise_core::chat::{ChatMessage, SessionSummary};
use giftwise_core::recommendations::{NewRecommendation, Recommendation};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),
    /// A stored row could not be mapped back to a domain value.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Account fields needed to create a user. `email` is already normalized.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// What login needs to check a password.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub password_hash: String,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> StoreResult<()>;

    /// Store all recommendations or none of them. Order is preserved.
    async fn insert_recommendations(
        &self,
        recommendations: Vec<NewRecommendation>,
    ) -> StoreResult<Vec<Recommendation>>;

    async fn insert_message(&self, message: &ChatMessage) -> StoreResult<()>;

    /// The latest `limit` messages of a session, oldest first.
    async fn recent_messages(&self, session_id: &str, limit: i64) -> StoreResult<Vec<ChatMessage>>;

    /// The first `limit` messages of a session, oldest first.
    async fn session_history(&self, session_id: &str, limit: i64)
    -> StoreResult<Vec<ChatMessage>>;

    /// Per-session summaries of `user_id`'s messages, most recent session
    /// first, at most `limit` of them. Previews are already truncated.
    async fn session_summaries(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<SessionSummary>>;

    /// Remove a session's messages. Returns how many were deleted.
    async fn delete_session(&self, session_id: &str) -> StoreResult<u64>;

    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>>;

    async fn insert_access_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Resolve an unexpired token digest to its user.
    async fn user_for_token(&self, token_hash: &str) -> StoreResult<Option<User>>;
}
