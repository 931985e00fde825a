//! Error types shared by the gateway, the session and the views.

use crate::api::ApiError;
use thiserror::Error;

/// Why a user action failed.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The backend could not be reached or rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Input was rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The caller's role is not allowed to perform the action.
    #[error("{0}")]
    Forbidden(String),

    /// Local storage could not be read or written.
    #[error("Local storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A persisted entry could not be encoded.
    #[error("Local storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ClientError::Forbidden(message.into())
    }
}
