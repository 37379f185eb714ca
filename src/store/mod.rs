//! Persisted client state and the storage abstraction over it.
//!
//! This module defines the single `AppState` record the sync core
//! reconciles on every page load, plus the `StateStore` trait that
//! abstracts the embedder's key-value backend (IndexedDB in a browser,
//! memory in tests). The store is assumed single-record-atomic with no
//! cross-key transactions, which is why each pass reads `AppState` once,
//! mutates it in place, and writes it back once.

mod memory;
mod signals;

pub use memory::MemoryStateStore;
pub use signals::{signal_keys, SignalStore};

use std::collections::HashMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known option keys.
pub mod option_keys {
    /// Last observed native notification permission
    pub const NOTIFICATION_PERMISSION: &str = "notification_permission";
    /// Persisted click-replay matching policy (`origin` | `exact`)
    pub const CLICK_HANDLER_MATCH: &str = "notification_click_handler_match";
}

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Stored value could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend rejected the read or write
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Last-known push-enabled baseline.
///
/// `Unset` means "never recorded" and is load-bearing: the first
/// observation of either live state always counts as a change. The wire
/// format stays `null | true | false` so records persisted before this
/// type existed keep deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum PushEnabledState {
    #[default]
    Unset,
    Enabled,
    Disabled,
}

impl PushEnabledState {
    pub fn from_bool(enabled: bool) -> Self {
        if enabled {
            PushEnabledState::Enabled
        } else {
            PushEnabledState::Disabled
        }
    }
}

impl From<Option<bool>> for PushEnabledState {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => PushEnabledState::Unset,
            Some(enabled) => PushEnabledState::from_bool(enabled),
        }
    }
}

impl From<PushEnabledState> for Option<bool> {
    fn from(state: PushEnabledState) -> Self {
        match state {
            PushEnabledState::Unset => None,
            PushEnabledState::Enabled => Some(true),
            PushEnabledState::Disabled => Some(false),
        }
    }
}

/// A notification click captured while no page was open, awaiting replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickRecord {
    /// The notification's landing URL; also the inbox key
    pub url: String,
    /// Opaque click payload, forwarded verbatim to the event bus
    #[serde(default)]
    pub data: serde_json::Value,
    /// Epoch millis of the original click; absent means no freshness
    /// constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// The single persisted record the sync core reconciles.
///
/// `clicked_notifications` is a pending-delivery inbox: entries are
/// created by the out-of-band click handler and destroyed exclusively by
/// the replayer. A `None` slot is a tombstone left by a completed replay;
/// repeated passes observe the record as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub last_known_push_enabled: PushEnabledState,
    #[serde(default)]
    pub clicked_notifications: HashMap<String, Option<ClickRecord>>,
}

/// Storage backend for the sync core's persisted state.
///
/// # Consistency
///
/// Operations are single-record-atomic and eventually consistent; there
/// are no multi-key transactions. Callers sequence their read-modify-write
/// cycles; the core never runs two passes against the same record
/// concurrently.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the application state record.
    async fn get_app_state(&self) -> Result<AppState, StoreError>;

    /// Replace the application state record.
    async fn set_app_state(&self, state: AppState) -> Result<(), StoreError>;

    /// Read an option value by key.
    async fn get_option(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Write an option value.
    async fn put_option(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    /// Delete an option value.
    async fn delete_option(&self, key: &str) -> Result<(), StoreError>;
}

/// Read an option and deserialize it into `T`.
///
/// A stored value that no longer parses as `T` is treated the same as an
/// absent one; stale junk in the options table must not fail a sync pass.
pub async fn get_typed_option<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(value) = store.get_option(key).await? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(error) => {
            tracing::debug!(key, %error, "Ignoring malformed option value");
            Ok(None)
        }
    }
}
