//! Error types for the session/storage service.

use thiserror::Error;

/// Errors that can occur while handling session, storage or mask requests.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// I/O error in a filesystem-backed store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request body or field failed validation
    #[error("{message}")]
    InvalidRequest {
        /// Description of what is wrong with the request
        message: String,
    },

    /// One or more required fields are absent after session fallback
    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFields {
        /// Names of the missing fields
        fields: Vec<String>,
    },

    /// No live session with this id
    #[error("Session not found")]
    SessionNotFound {
        /// The requested session id
        id: String,
    },

    /// No blob stored at this path
    #[error("Image not found")]
    BlobNotFound {
        /// The requested blob path
        path: String,
    },

    /// Blob path is not acceptable (absolute, traversal, empty)
    #[error("Invalid storage path: {path}")]
    InvalidPath {
        /// The rejected path
        path: String,
    },

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Base64 payload could not be decoded
    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl ServiceError {
    /// Create an invalid request error with a message.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a storage error with a message.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a session not found error.
    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound { id: id.into() }
    }

    /// Create a blob not found error.
    pub fn blob_not_found(path: impl Into<String>) -> Self {
        Self::BlobNotFound { path: path.into() }
    }

    /// Whether the error was caused by the client rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. }
                | Self::MissingFields { .. }
                | Self::InvalidPath { .. }
                | Self::Base64(_)
                | Self::Json(_)
        )
    }

    /// Whether the error means "nothing stored under this key".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SessionNotFound { .. } | Self::BlobNotFound { .. })
    }
}

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors raised by the editor side talking to the service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure or unreadable response body
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("{context}: {message}")]
    Status {
        /// What the client was trying to do
        context: &'static str,
        /// HTTP status code
        status: u16,
        /// Error message from the response body, or the status text
        message: String,
    },

    /// The source image or mask could not be processed
    #[error("Canvas error: {0}")]
    Canvas(#[from] maskpaint_canvas::CanvasError),
}

impl ClientError {
    /// HTTP status of a rejected request, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
