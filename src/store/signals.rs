//! Ephemeral runtime signals with bounded history.
//!
//! Unlike the persisted `AppState`, signals live only for the page
//! session. Keeping the previous value alongside the latest lets callers
//! distinguish "just flipped" from "was already set".

use std::collections::VecDeque;

use dashmap::DashMap;

/// Most-recent values kept per key.
const SIGNAL_HISTORY_LIMIT: usize = 2;

/// Well-known signal keys.
pub mod signal_keys {
    /// Last observed opted-out flag, independent of push-enabled
    pub const SUBSCRIPTION_OPTED_OUT: &str = "subscription.opted_out";
}

/// Bounded per-key history of runtime signal values.
#[derive(Debug, Default)]
pub struct SignalStore {
    signals: DashMap<String, VecDeque<serde_json::Value>>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new value for `key`, evicting the oldest past the limit.
    pub fn put(&self, key: &str, value: serde_json::Value) {
        let mut history = self.signals.entry(key.to_string()).or_default();
        history.push_back(value);
        while history.len() > SIGNAL_HISTORY_LIMIT {
            history.pop_front();
        }
    }

    /// Latest recorded value for `key`.
    pub fn last(&self, key: &str) -> Option<serde_json::Value> {
        self.signals.get(key).and_then(|h| h.back().cloned())
    }

    /// Value recorded immediately before the latest one.
    pub fn previous(&self, key: &str) -> Option<serde_json::Value> {
        self.signals
            .get(key)
            .filter(|h| h.len() >= 2)
            .and_then(|h| h.get(h.len() - 2).cloned())
    }
}
