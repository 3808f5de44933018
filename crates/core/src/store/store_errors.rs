//! Error types for the shared state store.

use thiserror::Error;

/// Failures inside the store.
///
/// Most of these never leave the store: the best-effort API logs them and
/// degrades to a no-op. Only pending-batch reads surface them, so the drain
/// can tell a corrupt file from a missing one.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("App group '{0}' could not be resolved")]
    ContainerUnavailable(String),

    #[error("Invalid store key '{0}'")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No free pending file name for account '{0}'")]
    NameExhausted(String),
}
