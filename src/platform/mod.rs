//! Platform surface the sync core reads from.
//!
//! The embedding runtime (a browser bridge in production) answers two
//! questions: is push currently enabled for this user, and what is the
//! native notification permission. The core never caches the answers;
//! every detection pass queries live state and diffs it against the
//! persisted baseline.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the platform bridge.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The underlying permission/subscription query rejected
    #[error("platform query failed: {0}")]
    Query(String),

    /// Push messaging is not available in this environment
    #[error("push messaging is unsupported in this environment")]
    Unsupported,
}

/// Native notification permission, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    /// Permission has not been requested yet
    #[default]
    Default,
    /// The user granted notification permission
    Granted,
    /// The user denied notification permission
    Denied,
}

impl NotificationPermission {
    /// The wire string used when persisting the permission as an option value.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationPermission::Default => "default",
            NotificationPermission::Granted => "granted",
            NotificationPermission::Denied => "denied",
        }
    }
}

impl fmt::Display for NotificationPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live subscription/permission queries against the platform.
///
/// Implementations must be thread-safe (`Send + Sync`); they are shared
/// across the detectors through an `Arc`.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Whether push notifications are currently enabled for this user.
    async fn is_push_enabled(&self) -> Result<bool, PlatformError>;

    /// Current native notification permission.
    async fn notification_permission(&self) -> Result<NotificationPermission, PlatformError>;
}
