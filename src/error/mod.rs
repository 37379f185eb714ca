use thiserror::Error;

use crate::api::ApiError;
use crate::context::ContextError;
use crate::platform::PlatformError;
use crate::store::StoreError;

/// Top-level error for sync passes.
///
/// Every component propagates its collaborator's error type; this enum is
/// what a page-load pass ultimately rejects with. Nothing is retried
/// internally; the embedder decides whether to re-run the pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Outbound API error: {0}")]
    Api(#[from] ApiError),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type Result<T> = std::result::Result<T, SyncError>;
