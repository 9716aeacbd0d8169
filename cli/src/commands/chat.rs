use clap::Subcommand;
use serde_json::json;

use crate::util::api_request;

#[derive(Subcommand)]
pub enum ChatCommands {
    /// Send a message and print the assistant's reply
    Send {
        /// Session to continue (a new one is started if omitted)
        #[arg(long)]
        session: Option<String>,
        #[arg(long, env = "GIFTWISE_USER_ID")]
        user: String,
        /// The message text
        message: String,
        /// Optional preference, repeatable (e.g. --pref occasion=Birthday)
        #[arg(long = "pref", value_parser = parse_preference)]
        preferences: Vec<(String, String)>,
    },
    /// Show a session's messages, oldest first
    History {
        session: String,
        /// Maximum number of messages (server default 50)
        #[arg(long)]
        limit: Option<u32>,
    },
    /// List a user's sessions, most recent first
    Sessions {
        #[arg(env = "GIFTWISE_USER_ID")]
        user: String,
    },
    /// Delete every message of a session
    Clear { session: String },
}

pub async fn run(api_url: &str, command: ChatCommands, raw: bool) -> i32 {
    match command {
        ChatCommands::Send {
            session,
            user,
            message,
            preferences,
        } => {
            let session = session.unwrap_or_else(|| uuid::Uuid::now_v7().to_string());
            let mut body = json!({
                "sessionId": session,
                "userId": user,
                "message": message,
            });
            if !preferences.is_empty() {
                body["preferences"] = preferences
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect::<serde_json::Map<_, _>>()
                    .into();
            }
            api_request(
                api_url,
                reqwest::Method::POST,
                "/api/chat/message",
                None,
                Some(body),
                &[],
                raw,
            )
            .await
        }
        ChatCommands::History { session, limit } => {
            let query: Vec<(String, String)> = limit
                .map(|l| vec![("limit".to_string(), l.to_string())])
                .unwrap_or_default();
            api_request(
                api_url,
                reqwest::Method::GET,
                &format!("/api/chat/history/{session}"),
                None,
                None,
                &query,
                raw,
            )
            .await
        }
        ChatCommands::Sessions { user } => {
            api_request(
                api_url,
                reqwest::Method::GET,
                &format!("/api/chat/sessions/{user}"),
                None,
                None,
                &[],
                raw,
            )
            .await
        }
        ChatCommands::Clear { session } => {
            api_request(
                api_url,
                reqwest::Method::DELETE,
                &format!("/api/chat/session/{session}"),
                None,
                None,
                &[],
                raw,
            )
            .await
        }
    }
}

/// Parse `key=value` into a preference pair.
fn parse_preference(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing preference name in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
