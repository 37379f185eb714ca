//! Identity resolution capability.
//!
//! The welcome dispatcher needs the subscriber's user id and the
//! application id. Both are owned by the surrounding SDK, so they arrive
//! through this injected capability instead of ambient state; tests
//! substitute a fixed implementation.

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while resolving identities.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The user has no registered push subscription id
    #[error("user is not registered with the push platform")]
    MissingUserId,

    /// No application id is configured
    #[error("application id is not configured")]
    MissingAppId,

    /// The lookup itself failed
    #[error("identity lookup failed: {0}")]
    Lookup(String),
}

/// Resolves the identifiers a sync pass needs from the host SDK.
#[async_trait]
pub trait SyncContext: Send + Sync {
    /// The subscriber's user id on the push platform.
    async fn resolve_user_id(&self) -> Result<String, ContextError>;

    /// The application id this page is registered under.
    async fn resolve_app_id(&self) -> Result<String, ContextError>;
}
