//! In-memory state store.
//!
//! Backs tests and embedders that run without a persistent database.
//! State is lost when the process exits.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use super::{AppState, StateStore, StoreError};

/// In-memory `StateStore` implementation.
///
/// The single `AppState` record sits behind an `RwLock`; options use a
/// `DashMap` for per-key atomicity, matching the consistency the trait
/// promises (single-record-atomic, no cross-key transactions).
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    app_state: RwLock<AppState>,
    options: DashMap<String, serde_json::Value>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get_app_state(&self) -> Result<AppState, StoreError> {
        Ok(self.app_state.read().await.clone())
    }

    async fn set_app_state(&self, state: AppState) -> Result<(), StoreError> {
        *self.app_state.write().await = state;
        Ok(())
    }

    async fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.options.get(key).map(|entry| entry.value().clone()))
    }

    async fn put_option(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.options.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete_option(&self, key: &str) -> Result<(), StoreError> {
        self.options.remove(key);
        Ok(())
    }
}
