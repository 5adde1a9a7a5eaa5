//! Sync error types

use doc_store::StoreError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Errors raised by the reorder pipeline
#[derive(Debug, Error)]
pub enum SyncError {
    /// The move references an id that is not in the displayed list
    #[error("Invalid move: item {id} is not in the list")]
    InvalidMove { id: String },

    /// The batch write failed as a unit. `ambiguous` is set when the outcome
    /// is unknown (timeout, lost response) and the store must be re-read.
    #[error("Persistence error: {message}")]
    Persistence { message: String, ambiguous: bool },

    /// A commit is already in flight and the busy policy rejects new moves
    #[error("Reorder already in flight")]
    Busy,

    /// A remote snapshot superseded a pending local write
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// The backing store could not be reached
    #[error("Backend unavailable: {0}")]
    Backend(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    pub fn invalid_move(id: impl Into<String>) -> Self {
        Self::InvalidMove { id: id.into() }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            ambiguous: false,
        }
    }

    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            ambiguous: true,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Persistence { ambiguous: true, .. })
    }

    /// Error code for hosts (localization, toasts)
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidMove { .. } => ErrorCode::InvalidMove,
            Self::Persistence { ambiguous: false, .. } => ErrorCode::PersistenceFailed,
            Self::Persistence { ambiguous: true, .. } => ErrorCode::PersistenceAmbiguous,
            Self::Busy => ErrorCode::ReorderBusy,
            Self::ConcurrentModification(_) => ErrorCode::ConcurrentModification,
            Self::Backend(_) => ErrorCode::SystemBusy,
            Self::Store(StoreError::DocumentNotFound(..)) => ErrorCode::DocumentNotFound,
            Self::Store(_) => ErrorCode::DatabaseError,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::InvalidMove { id } => AppError::invalid_move(id),
            // Persistence keeps the user-facing message; technical detail goes to details
            SyncError::Persistence { message, ambiguous } => {
                AppError::persistence(ambiguous).with_detail("cause", message)
            }
            SyncError::Store(e) => e.into(),
            other => AppError::with_message(other.code(), other.to_string()),
        }
    }
}
