//! Adapter for the generative-language model behind gift suggestions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GeminiConfig;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 120;
/// Upper bound on how much of an error body ends up in logs and responses.
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("request to the model failed: {0}")]
    Transport(reqwest::Error),
    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model response contained no text")]
    EmptyResponse,
}

// Request URLs are dropped so a transport failure never echoes the endpoint.
impl From<reqwest::Error> for ModelError {
    fn from(err: reqwest::Error) -> Self {
        ModelError::Transport(err.without_url())
    }
}

/// Produces free-form text for a prompt.
#[async_trait]
pub trait GiftModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl GiftModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        tracing::debug!(model = %self.model, candidates = body.candidates.len(), "Model responded");

        body.first_text().ok_or(ModelError::EmptyResponse)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate's first text part.
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|part| part.text)
    }
}
