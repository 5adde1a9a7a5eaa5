//! Batch write DTOs

use serde::{Deserialize, Serialize};

use super::ordered_item::OrderedItemUpdate;

/// Compact write-set entry: the new position of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrderItem {
    pub id: String,
    pub order: i64,
}

impl SortOrderItem {
    pub fn new(id: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            order,
        }
    }
}

/// One entry of an atomic batch write: `{id, fields}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub id: String,
    pub fields: OrderedItemUpdate,
}

impl From<SortOrderItem> for ItemUpdate {
    fn from(item: SortOrderItem) -> Self {
        Self {
            id: item.id,
            fields: OrderedItemUpdate::order(item.order),
        }
    }
}

impl From<&SortOrderItem> for ItemUpdate {
    fn from(item: &SortOrderItem) -> Self {
        Self {
            id: item.id.clone(),
            fields: OrderedItemUpdate::order(item.order),
        }
    }
}
