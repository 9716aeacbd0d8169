use std::sync::Arc;

use crate::gemini::GiftModel;
use crate::store::Store;

/// Shared handler state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub model: Arc<dyn GiftModel>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, model: Arc<dyn GiftModel>) -> Self {
        Self { store, model }
    }
}
