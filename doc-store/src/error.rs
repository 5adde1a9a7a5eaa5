//! Store error types

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document not found: {0}/{1}")]
    DocumentNotFound(String, String),

    #[error("Document already exists: {0}/{1}")]
    DocumentExists(String, String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Classify a store error into a host-facing code
fn classify(e: &StoreError) -> ErrorCode {
    match e {
        StoreError::DocumentNotFound(..) => return ErrorCode::DocumentNotFound,
        StoreError::DocumentExists(..) => return ErrorCode::AlreadyExists,
        StoreError::Serialization(_) => return ErrorCode::InvalidFormat,
        _ => {}
    }

    // redb errors are classified by message
    let err_str = e.to_string().to_lowercase();
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }
    if err_str.contains("no space") || err_str.contains("enospc") || err_str.contains("busy") {
        return ErrorCode::SystemBusy;
    }
    ErrorCode::DatabaseError
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let code = classify(&err);
        match err {
            StoreError::DocumentNotFound(collection, id) => {
                AppError::document_not_found(collection, id)
            }
            other => AppError::with_message(code, other.to_string()),
        }
    }
}
