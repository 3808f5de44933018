//! Core error types for the FinanceKit relay.
//!
//! [`Error`] is the closed taxonomy every JS-facing method rejects with. The
//! narrower error types of the store, the native boundary and the event
//! pipeline live next to the code that raises them and convert into it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error kept as context when a failure cannot be categorized.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Root error type surfaced to the JS layer.
///
/// Every variant maps to exactly one [`ErrorCode`], which is what the JS side
/// switches on. Uncategorized native failures are wrapped as
/// [`Error::Unknown`] with the original error preserved as `source`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("FinanceKit is not available: {0}")]
    Unavailable(String),

    #[error("FinanceKit access has not been authorized")]
    Unauthorized,

    #[error("Invalid account id: '{0}'")]
    InvalidAccountId(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Unexpected error: {message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

/// Closed set of error codes carried by rejected JS promises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    Unavailable,
    Unauthorized,
    InvalidAccountId,
    AccountNotFound,
    InvalidDateRange,
    RateLimitExceeded,
    NetworkError,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unavailable => "UNAVAILABLE",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::InvalidAccountId => "INVALID_ACCOUNT_ID",
            ErrorCode::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ErrorCode::InvalidDateRange => "INVALID_DATE_RANGE",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{code, message}` object a promise is rejected with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
}

impl Error {
    /// Creates an Unknown error without an underlying cause.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an uncategorized failure, keeping it as context.
    pub fn wrap<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Unknown {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Returns the closed-set code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Unavailable(_) => ErrorCode::Unavailable,
            Error::Unauthorized => ErrorCode::Unauthorized,
            Error::InvalidAccountId(_) => ErrorCode::InvalidAccountId,
            Error::AccountNotFound(_) => ErrorCode::AccountNotFound,
            Error::InvalidDateRange(_) => ErrorCode::InvalidDateRange,
            Error::RateLimitExceeded => ErrorCode::RateLimitExceeded,
            Error::NetworkError(_) => ErrorCode::NetworkError,
            Error::Unknown { .. } => ErrorCode::Unknown,
        }
    }

    /// Builds the rejection object handed to JS.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::wrap(err)
    }
}
