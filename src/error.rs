//! Error types for AlumniConnect.

use thiserror::Error;
use uuid::Uuid;

use crate::auth::permission::PermissionError;
use crate::auth::validation::ValidationError;
use crate::remote::{RemoteError, Table};

/// Common error type for AlumniConnect.
#[derive(Error, Debug)]
pub enum AlumniError {
    /// Authentication failed (bad credentials, duplicate email, expired session).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Input rejected before any remote call was made.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The identity was created but cannot sign in until its email is
    /// confirmed.
    #[error("email confirmation pending for user {0}")]
    ConfirmationPending(Uuid),

    /// An identity exists but has no matching profile row.
    #[error("profile not found for user {0}")]
    ProfileMissing(Uuid),

    /// Duplicate registration, application or connection request.
    #[error("{}", .0.duplicate_message())]
    Uniqueness(Table),

    /// A referenced row does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The current profile may not perform the operation.
    #[error("permission denied: {0}")]
    Permission(#[from] PermissionError),

    /// Network or data service failure.
    #[error("remote service error: {0}")]
    Remote(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl AlumniError {
    /// Whether this error is a duplicate-row condition rather than a failure.
    pub fn is_uniqueness(&self) -> bool {
        matches!(self, AlumniError::Uniqueness(_))
    }
}

impl From<RemoteError> for AlumniError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::InvalidCredentials => AlumniError::Auth("invalid credentials".to_string()),
            RemoteError::EmailTaken => AlumniError::Auth("email already registered".to_string()),
            RemoteError::SessionExpired => AlumniError::Auth("session expired".to_string()),
            RemoteError::UniqueViolation(table) => AlumniError::Uniqueness(table),
            RemoteError::Service(msg) => AlumniError::Remote(msg),
        }
    }
}

/// Result type alias for AlumniConnect operations.
pub type Result<T> = std::result::Result<T, AlumniError>;
