//! Order model: canonical display order of a collection
//!
//! Sort key is `order` ascending, then `created_at` descending. Collisions on
//! `order` are tolerated, not prevented; the id is a final tie-breaker so the
//! sequence is deterministic even when both keys collide.

use std::cmp::Ordering;

use shared::models::OrderedItem;

/// Display-order comparison
pub fn compare(a: &OrderedItem, b: &OrderedItem) -> Ordering {
    a.order
        .cmp(&b.order)
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort an unordered fetch into display order
pub fn sort_items(mut items: Vec<OrderedItem>) -> Vec<OrderedItem> {
    items.sort_by(compare);
    items
}

/// `order` for an item appended to the end
pub fn next_order(items: &[OrderedItem]) -> i64 {
    items
        .iter()
        .map(|item| item.order)
        .max()
        .map_or(0, |max| max + 1)
}

/// `(id, order)` pairs in display order
pub fn signature(items: &[OrderedItem]) -> Vec<(&str, i64)> {
    let mut refs: Vec<&OrderedItem> = items.iter().collect();
    refs.sort_by(|a, b| compare(a, b));
    refs.into_iter().map(|item| (item.id.as_str(), item.order)).collect()
}

/// Whether two lists (in any order) describe the same ordering
pub fn same_order(a: &[OrderedItem], b: &[OrderedItem]) -> bool {
    a.len() == b.len() && signature(a) == signature(b)
}

/// Whether the sorted `order` values are exactly `0..n`
pub fn is_contiguous(items: &[OrderedItem]) -> bool {
    signature(items)
        .iter()
        .enumerate()
        .all(|(index, (_, order))| *order == index as i64)
}
