//! Unified error system for ordered-collection sync
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Ordering errors
//! - 2xxx: Persistence errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::PersistenceFailed);
//! assert_eq!(err.message, "Error updating order, please try again");
//!
//! let err = AppError::invalid_move("item-3").with_detail("collection", "diet");
//! assert_eq!(err.code, ErrorCode::InvalidMove);
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
