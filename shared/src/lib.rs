//! Shared types for ordered-collection sync
//!
//! Common types used by the document store and the sync engine: the ordered
//! item model, batch write DTOs, move intents, live-update messages and the
//! unified error system.

pub mod error;
pub mod intent;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use intent::{CrudAction, ItemAction, MoveIntent};
pub use message::{ChangeKind, CollectionChange};
pub use models::{ItemUpdate, OrderedItem, OrderedItemCreate, OrderedItemUpdate, SortOrderItem};
