//! Data models shared by the store and the sync engine

pub mod ordered_item;
pub mod sort_order;

pub use ordered_item::{OrderedItem, OrderedItemCreate, OrderedItemUpdate};
pub use sort_order::{ItemUpdate, SortOrderItem};
