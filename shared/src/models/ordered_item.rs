//! Ordered item model

use serde::{Deserialize, Serialize};

/// A document that participates in an ordered collection
///
/// The `order` field is the only thing the sync engine cares about; the
/// remaining payload belongs to whatever page hosts the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItem {
    pub id: String,
    /// Ascending sort position. Not required to be contiguous; a document
    /// stored without it sorts as `0`.
    #[serde(default)]
    pub order: i64,
    /// Unix millis, tie-breaker (newest first) when `order` collides
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,

    // -- Payload --
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub done: bool,
}

impl OrderedItem {
    pub fn new(id: impl Into<String>, order: i64, title: impl Into<String>) -> Self {
        let now = crate::util::now_millis();
        Self {
            id: id.into(),
            order,
            created_at: now,
            updated_at: now,
            title: title.into(),
            body: None,
            done: false,
        }
    }

    /// Build a new item from a create payload at the given position
    pub fn from_create(id: impl Into<String>, order: i64, data: OrderedItemCreate) -> Self {
        let mut item = Self::new(id, order, data.title);
        item.body = data.body;
        item
    }

    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Create item payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderedItemCreate {
    pub title: String,
    pub body: Option<String>,
}

/// Update item payload (the `fields` of a batch write entry)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedItemUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl OrderedItemUpdate {
    pub fn order(order: i64) -> Self {
        Self {
            order: Some(order),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.done.is_none() && self.order.is_none()
    }

    /// Apply the set fields onto an item. `updated_at` is left to the caller.
    pub fn apply_to(&self, item: &mut OrderedItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(body) = &self.body {
            item.body = Some(body.clone());
        }
        if let Some(done) = self.done {
            item.done = done;
        }
        if let Some(order) = self.order {
            item.order = order;
        }
    }
}
