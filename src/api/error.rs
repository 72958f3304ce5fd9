//! provides error types delivered to the calling application.
//!
//! The messages of [`InvalidRequest`] are matched on by callers and must not
//! be reworded.

use serde::Deserialize;
use serde::Serialize;

/// enumerates the reasons a request is refused before any key is touched
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequest {
    #[error("Empty request")]
    EmptyRequest,

    #[error("appName is required")]
    AppNameRequired,

    #[error("keyId is required")]
    KeyIdRequired,

    #[error("Unknown keyId")]
    UnknownKeyId,

    #[error("Cannot derive addresses for single-account wallets")]
    SingleAccountWallet,

    #[error("Invalid baseKeyPath")]
    InvalidBaseKeyPath,

    #[error("Invalid indicesToDerive")]
    InvalidIndicesToDerive,
}

impl InvalidRequest {
    /// the caller-facing message
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// enumerates the ways a keyguard request can end without a result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum KeyguardError {
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequest),

    /// the user aborted the request
    #[error("Request canceled")]
    Cancel,

    // the processor went away without completing the request
    #[error("operation failed.  reason: {0}")]
    Unexpected(String),
}

impl KeyguardError {
    /// the error name the caller dispatches on
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::Cancel => "Cancel",
            Self::Unexpected(_) => "Unexpected",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            name: self.name().to_string(),
            message: self.to_string(),
        }
    }
}

/// Serializable form of a [`KeyguardError`] as delivered to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub name: String,
    pub message: String,
}

// convert anyhow::Error to a KeyguardError::Unexpected.
// note that anyhow Error is not serializable.
impl From<anyhow::Error> for KeyguardError {
    fn from(e: anyhow::Error) -> Self {
        Self::Unexpected(e.to_string())
    }
}
