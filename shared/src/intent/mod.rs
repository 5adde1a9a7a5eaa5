//! Intent types - resolved user actions on an ordered collection
//!
//! A drag gesture resolves to a [`MoveIntent`]; item lifecycle edits are
//! expressed as a [`CrudAction`]. Both carry ids, never indices, so they stay
//! valid while the displayed list changes underneath them.

use serde::{Deserialize, Serialize};

use crate::models::{OrderedItemCreate, OrderedItemUpdate};

/// "Move item `source_id` to the position currently held by `target_id`"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveIntent {
    pub source_id: String,
    pub target_id: String,
}

impl MoveIntent {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }

    /// Intent that moves an item onto itself
    pub fn is_noop(&self) -> bool {
        self.source_id == self.target_id
    }
}

/// Generic CRUD action
///
/// - `C`: Create payload
/// - `U`: Update payload (fields are usually Option)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CrudAction<C, U> {
    Create(C),
    Update { id: String, data: U },
    Delete { id: String },
}

/// CRUD action on an ordered item
pub type ItemAction = CrudAction<OrderedItemCreate, OrderedItemUpdate>;
