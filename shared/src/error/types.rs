//! Error types

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the host-facing error type, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (ids, collection, context)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Category derived from the code range
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Emit a log line for system errors; other categories are expected
    /// outcomes and stay at debug level.
    pub fn log(&self) {
        if matches!(self.category(), ErrorCategory::System) {
            tracing::error!(code = %self.code, message = %self.message, "System error occurred");
        } else {
            tracing::debug!(code = %self.code, message = %self.message, "Error returned");
        }
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    /// Create an invalid move error for an id missing from the list
    pub fn invalid_move(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::with_message(
            ErrorCode::InvalidMove,
            format!("Item {} is not in the list", id),
        )
        .with_detail("id", id)
    }

    /// Create a busy error (commit in flight)
    pub fn busy() -> Self {
        Self::new(ErrorCode::ReorderBusy)
    }

    /// Create a persistence error; the message stays the user-facing one
    pub fn persistence(ambiguous: bool) -> Self {
        if ambiguous {
            Self::new(ErrorCode::PersistenceAmbiguous)
        } else {
            Self::new(ErrorCode::PersistenceFailed)
        }
    }

    /// Create a document not found error
    pub fn document_not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        let (collection, id) = (collection.into(), id.into());
        Self::with_message(
            ErrorCode::DocumentNotFound,
            format!("Document {}/{} not found", collection, id),
        )
        .with_detail("collection", collection)
        .with_detail("id", id)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ConfigError, msg)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
