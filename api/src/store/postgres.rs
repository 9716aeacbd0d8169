use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use giftwise_core::chat::{ChatMessage, GiftContext, Sender, SessionSummary, session_preview};
use giftwise_core::recommendations::{NewRecommendation, Recommendation};

use super::{NewUser, Store, StoreError, StoreResult, User, UserCredentials};

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_recommendations(
        &self,
        recommendations: Vec<NewRecommendation>,
    ) -> StoreResult<Vec<Recommendation>> {
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(recommendations.len());

        for rec in recommendations {
            let id = Uuid::now_v7();
            sqlx::query(
                r#"
                INSERT INTO recommendations
                    (id, gift_name, description, price_range, platform, product_image, search_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(id)
            .bind(&rec.gift_name)
            .bind(&rec.description)
            .bind(&rec.price_range)
            .bind(&rec.platform)
            .bind(&rec.product_image)
            .bind(&rec.search_url)
            .execute(&mut *tx)
            .await?;

            stored.push(rec.with_id(id));
        }

        tx.commit().await?;
        Ok(stored)
    }

    async fn insert_message(&self, message: &ChatMessage) -> StoreResult<()> {
        let gift_context = message
            .gift_context
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("Failed to serialize gift_context: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, session_id, user_id, message, sender, timestamp, gift_context)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id)
        .bind(&message.session_id)
        .bind(&message.user_id)
        .bind(&message.message)
        .bind(message.sender.as_str())
        .bind(message.timestamp)
        .bind(gift_context)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_messages(&self, session_id: &str, limit: i64) -> StoreResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, session_id, user_id, message, sender, timestamp, gift_context
            FROM chat_messages
            WHERE session_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = rows
            .into_iter()
            .map(ChatMessageRow::into_message)
            .collect::<StoreResult<Vec<_>>>()?;
        messages.reverse();
        Ok(messages)
    }

    async fn session_history(
        &self,
        session_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, session_id, user_id, message, sender, timestamp, gift_context
            FROM chat_messages
            WHERE session_id = $1
            ORDER BY timestamp ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ChatMessageRow::into_message).collect()
    }

    async fn session_summaries(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<SessionSummary>> {
        // Last message per session wins; equal timestamps fall back to the later id.
        let rows = sqlx::query_as::<_, SessionSummaryRow>(
            r#"
            WITH last_messages AS (
                SELECT DISTINCT ON (session_id) session_id, message, timestamp
                FROM chat_messages
                WHERE user_id = $1
                ORDER BY session_id, timestamp DESC, id DESC
            ),
            counts AS (
                SELECT session_id, COUNT(*) AS message_count
                FROM chat_messages
                WHERE user_id = $1
                GROUP BY session_id
            )
            SELECT l.session_id, l.message AS last_message, l.timestamp AS last_timestamp,
                   c.message_count
            FROM last_messages l
            JOIN counts c ON c.session_id = l.session_id
            ORDER BY l.timestamp DESC, l.session_id ASC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SessionSummary::from).collect())
    }

    async fn delete_session(&self, session_id: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let id = Uuid::now_v7();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, email, created_at
            "#,
        )
        .bind(id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    return StoreError::DuplicateEmail(user.email.clone());
                }
            }
            StoreError::Database(e)
        })?;

        Ok(row.into())
    }

    async fn find_credentials(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            "SELECT id, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserCredentials {
            id: r.id,
            password_hash: r.password_hash,
        }))
    }

    async fn insert_access_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO access_tokens (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::now_v7())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn user_for_token(&self, token_hash: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT u.id, u.first_name, u.last_name, u.email, u.created_at \
             FROM access_tokens t \
             JOIN users u ON u.id = t.user_id \
             WHERE t.token_hash = $1 \
               AND t.expires_at > NOW()",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}

/// Internal row type for sqlx mapping
#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    id: Uuid,
    session_id: String,
    user_id: String,
    message: String,
    sender: String,
    timestamp: DateTime<Utc>,
    gift_context: Option<serde_json::Value>,
}

impl ChatMessageRow {
    fn into_message(self) -> StoreResult<ChatMessage> {
        let sender = self.sender.parse::<Sender>().map_err(StoreError::Corrupt)?;

        // Older rows may carry context written by other clients; drop what doesn't decode.
        let gift_context = self
            .gift_context
            .and_then(|value| serde_json::from_value::<GiftContext>(value).ok());

        Ok(ChatMessage {
            id: self.id,
            session_id: self.session_id,
            user_id: self.user_id,
            message: self.message,
            sender,
            timestamp: self.timestamp,
            gift_context,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionSummaryRow {
    session_id: String,
    last_message: String,
    last_timestamp: DateTime<Utc>,
    message_count: i64,
}

impl From<SessionSummaryRow> for SessionSummary {
    fn from(row: SessionSummaryRow) -> Self {
        SessionSummary {
            session_id: row.session_id,
            last_message: session_preview(&row.last_message),
            last_timestamp: row.last_timestamp,
            message_count: row.message_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    id: Uuid,
    password_hash: String,
}
