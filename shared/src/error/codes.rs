//! Unified error codes for ordered-collection sync
//!
//! Error codes are shared by the store, the sync engine and whatever host
//! renders the list. Hosts localize by code, never by message text.
//!
//! - 0xxx: General errors
//! - 1xxx: Ordering errors (move intents, reducer)
//! - 2xxx: Persistence errors (batch writes, reconciliation)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Ordering ====================
    /// Move references an id that is not in the list
    InvalidMove = 1001,
    /// A reorder commit is already in flight for this collection
    ReorderBusy = 1002,

    // ==================== 2xxx: Persistence ====================
    /// Batch write was rejected as a unit
    PersistenceFailed = 2001,
    /// Batch write outcome unknown (timeout, lost response)
    PersistenceAmbiguous = 2002,
    /// Document referenced by a write does not exist
    DocumentNotFound = 2003,
    /// A remote snapshot superseded a pending local write
    ConcurrentModification = 2004,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Storage corrupted (data file damaged)
    StorageCorrupted = 9403,
    /// System busy (IO error, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Ordering
            ErrorCode::InvalidMove => "Move references an item that is not in the list",
            ErrorCode::ReorderBusy => "Another reorder is still being saved",

            // Persistence
            ErrorCode::PersistenceFailed => "Error updating order, please try again",
            ErrorCode::PersistenceAmbiguous => "Order update could not be confirmed",
            ErrorCode::DocumentNotFound => "Document not found",
            ErrorCode::ConcurrentModification => "List was changed elsewhere",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StorageCorrupted => "Storage corrupted (data file damaged)",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }

    /// Whether the user can reasonably retry the same action
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::ReorderBusy
                | ErrorCode::PersistenceFailed
                | ErrorCode::PersistenceAmbiguous
                | ErrorCode::SystemBusy
        )
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Ordering
            1001 => Ok(ErrorCode::InvalidMove),
            1002 => Ok(ErrorCode::ReorderBusy),

            // Persistence
            2001 => Ok(ErrorCode::PersistenceFailed),
            2002 => Ok(ErrorCode::PersistenceAmbiguous),
            2003 => Ok(ErrorCode::DocumentNotFound),
            2004 => Ok(ErrorCode::ConcurrentModification),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9403 => Ok(ErrorCode::StorageCorrupted),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::InvalidMove.code(), 1001);
        assert_eq!(ErrorCode::ReorderBusy.code(), 1002);
        assert_eq!(ErrorCode::PersistenceFailed.code(), 2001);
        assert_eq!(ErrorCode::PersistenceAmbiguous.code(), 2002);
        assert_eq!(ErrorCode::DocumentNotFound.code(), 2003);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
        assert_eq!(ErrorCode::SystemBusy.code(), 9404);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::InvalidMove.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(1001), Ok(ErrorCode::InvalidMove));
        assert_eq!(ErrorCode::try_from(2004), Ok(ErrorCode::ConcurrentModification));
        assert_eq!(ErrorCode::try_from(9003), Ok(ErrorCode::ConfigError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(4001), Err(InvalidErrorCode(4001)));
        assert_eq!(ErrorCode::try_from(65535), Err(InvalidErrorCode(65535)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::PersistenceFailed).unwrap();
        assert_eq!(json, "2001");
        let code: ErrorCode = serde_json::from_str("1002").unwrap();
        assert_eq!(code, ErrorCode::ReorderBusy);
        assert!(serde_json::from_str::<ErrorCode>("4242").is_err());
    }

    #[test]
    fn test_persistence_message_is_user_facing() {
        assert_eq!(
            ErrorCode::PersistenceFailed.message(),
            "Error updating order, please try again"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::PersistenceFailed.is_retryable());
        assert!(ErrorCode::ReorderBusy.is_retryable());
        assert!(!ErrorCode::InvalidMove.is_retryable());
        assert!(!ErrorCode::StorageCorrupted.is_retryable());
    }
}
