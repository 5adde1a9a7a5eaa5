//! Live-update messages pushed by the backing store
//!
//! Every committed write publishes the full snapshot of the touched
//! collection, so a subscriber that missed a message only needs the next one.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::OrderedItem;

/// What kind of write produced a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
    BatchUpdated,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Inserted => write!(f, "inserted"),
            ChangeKind::Updated => write!(f, "updated"),
            ChangeKind::Deleted => write!(f, "deleted"),
            ChangeKind::BatchUpdated => write!(f, "batch_updated"),
        }
    }
}

/// Full-snapshot push for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionChange {
    pub collection: String,
    /// Store-wide change sequence, strictly increasing per commit
    pub sequence: u64,
    pub kind: ChangeKind,
    /// Unordered snapshot of the collection after the write
    pub items: Vec<OrderedItem>,
}

impl CollectionChange {
    pub fn is_for(&self, collection: &str) -> bool {
        self.collection == collection
    }
}
