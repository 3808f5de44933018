//! Errors raised by the native layer and their mapping onto [`Error`].

use thiserror::Error;

use crate::errors::Error;

/// Result type alias for native calls.
pub type NativeResult<T> = std::result::Result<T, NativeError>;

/// Failures reported by the native FinanceKit layer.
#[derive(Error, Debug)]
pub enum NativeError {
    #[error("FinanceKit unavailable: {0}")]
    Unavailable(String),

    #[error("Authorization denied by the native store")]
    Denied,

    #[error("Native store rejected account id '{0}'")]
    InvalidAccountId(String),

    #[error("Native store has no account '{0}'")]
    AccountNotFound(String),

    #[error("Native store is rate limiting requests")]
    RateLimited,

    #[error("Network failure: {0}")]
    Network(String),

    #[error("Native call failed: {0}")]
    Other(String),
}

impl NativeError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<NativeError> for Error {
    fn from(err: NativeError) -> Self {
        match err {
            NativeError::Unavailable(reason) => Error::Unavailable(reason),
            NativeError::Denied => Error::Unauthorized,
            NativeError::InvalidAccountId(id) => Error::InvalidAccountId(id),
            NativeError::AccountNotFound(id) => Error::AccountNotFound(id),
            NativeError::RateLimited => Error::RateLimitExceeded,
            NativeError::Network(reason) => Error::NetworkError(reason),
            other @ NativeError::Other(_) => Error::wrap(other),
        }
    }
}
