//! In-process [`Store`] for handler tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use giftwise_core::chat::{ChatMessage, SessionSummary, summarize_sessions};
use giftwise_core::recommendations::{NewRecommendation, Recommendation};

use super::{NewUser, Store, StoreError, StoreResult, User, UserCredentials};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    recommendations: Vec<Recommendation>,
    messages: Vec<ChatMessage>,
    users: Vec<(User, String)>,
    tokens: Vec<(String, Uuid, DateTime<Utc>)>,
}

impl MemoryStore {
    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.inner.lock().unwrap().recommendations.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.lock().unwrap().messages.clone()
    }

    fn sorted_where(&self, keep: impl Fn(&ChatMessage) -> bool) -> Vec<ChatMessage> {
        let mut messages: Vec<ChatMessage> = self
            .inner
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| keep(m))
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        messages
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_recommendations(
        &self,
        recommendations: Vec<NewRecommendation>,
    ) -> StoreResult<Vec<Recommendation>> {
        let stored: Vec<Recommendation> = recommendations
            .into_iter()
            .map(|rec| rec.with_id(Uuid::now_v7()))
            .collect();
        self.inner
            .lock()
            .unwrap()
            .recommendations
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn insert_message(&self, message: &ChatMessage) -> StoreResult<()> {
        self.inner.lock().unwrap().messages.push(message.clone());
        Ok(())
    }

    async fn recent_messages(&self, session_id: &str, limit: i64) -> StoreResult<Vec<ChatMessage>> {
        let messages = self.sorted_where(|m| m.session_id == session_id);
        let skip = messages.len().saturating_sub(limit as usize);
        Ok(messages.into_iter().skip(skip).collect())
    }

    async fn session_history(
        &self,
        session_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<ChatMessage>> {
        let messages = self.sorted_where(|m| m.session_id == session_id);
        Ok(messages.into_iter().take(limit as usize).collect())
    }

    async fn session_summaries(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<SessionSummary>> {
        let messages = self.sorted_where(|m| m.user_id == user_id);
        let mut sessions = summarize_sessions(&messages);
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn delete_session(&self, session_id: &str) -> StoreResult<u64> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.messages.len();
        inner.messages.retain(|m| m.session_id != session_id);
        Ok((before - inner.messages.len()) as u64)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }
        let created = User {
            id: Uuid::now_v7(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            created_at: Utc::now(),
        };
        inner.users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, hash)| UserCredentials {
                id: u.id,
                password_hash: hash.clone(),
            }))
    }

    async fn insert_access_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .tokens
            .push((token_hash.to_string(), user_id, expires_at));
        Ok(())
    }

    async fn user_for_token(&self, token_hash: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        let now = Utc::now();
        let user_id = inner
            .tokens
            .iter()
            .find(|(hash, _, expires_at)| hash == token_hash && *expires_at > now)
            .map(|(_, user_id, _)| *user_id);
        Ok(user_id.and_then(|id| {
            inner
                .users
                .iter()
                .find(|(u, _)| u.id == id)
                .map(|(u, _)| u.clone())
        }))
    }
}
