//! Router harness for handler tests: in-memory store plus a scripted model.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use crate::app;
use crate::gemini::{GiftModel, ModelError};
use crate::state::AppState;
use crate::store::memory::MemoryStore;

/// Model that replays queued replies and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GiftModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ModelError::EmptyResponse))
    }
}

/// A fenced single-item reply.
pub fn mug_reply() -> String {
    "```json\n{\"recommendations\":[{\"gift_name\":\"Mug\",\"description\":\"For coffee\",\
     \"price_range\":\"₹500\",\"platform\":\"Amazon\",\"product_image\":\"mug.png\",\
     \"search_url\":\"https://www.amazon.in/s?k=mug\"}]}\n```"
        .to_string()
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub model: Arc<ScriptedModel>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_replies(Vec::<Result<String, ModelError>>::new())
    }

    pub fn with_replies(replies: impl IntoIterator<Item = Result<String, ModelError>>) -> Self {
        let store = Arc::new(MemoryStore::default());
        let model = Arc::new(ScriptedModel {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::default(),
        });
        let state = AppState::new(store.clone(), model.clone());
        let router = app::router(false).with_state(state);
        Self {
            store,
            model,
            router,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_with_token(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            Request::get(uri)
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
