//! In-memory access token cell.
//!
//! Exactly one token is live at a time, owned by the store. The request
//! pipeline reads it at send time, so a renewal that lands between two
//! requests is visible to the second one without any further coordination.

use std::sync::{Arc, RwLock};

use tracing::warn;

/// Shared, in-memory holder for the current access token.
/// Clone is cheap and shares the underlying cell.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.inner.read().expect("token store lock poisoned").clone()
    }

    /// Store a new token. An empty or whitespace-only value is rejected with
    /// a warning rather than an error: a malformed renewal response must not
    /// crash the pipeline.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        if token.trim().is_empty() {
            warn!("Ignoring empty access token write");
            return;
        }
        *self.inner.write().expect("token store lock poisoned") = Some(token);
    }

    pub fn clear(&self) {
        *self.inner.write().expect("token store lock poisoned") = None;
    }
}
