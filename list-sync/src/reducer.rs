//! Reducer: pure array-move over the displayed sequence
//!
//! ```text
//! reduce([A0, B1, C2], B → A)
//!     ├─ 1. locate source (1) and target (0)
//!     ├─ 2. remove B, reinsert at 0       → [B, A, C]
//!     └─ 3. reassign order = index         → [B0, A1, C2]
//! ```
//!
//! Reindexing every item keeps order values contiguous and collision-free
//! after each move, even if the fetched list had gaps.

use std::collections::HashMap;

use shared::intent::MoveIntent;
use shared::models::{OrderedItem, SortOrderItem};

use crate::error::{SyncError, SyncResult};

fn position(list: &[OrderedItem], id: &str) -> SyncResult<usize> {
    list.iter()
        .position(|item| item.id == id)
        .ok_or_else(|| SyncError::invalid_move(id))
}

/// Apply a move to `list` (which must already be in display order)
///
/// Both ids are validated first; a move onto itself then returns the input
/// untouched, without reindexing.
pub fn reduce(list: &[OrderedItem], intent: &MoveIntent) -> SyncResult<Vec<OrderedItem>> {
    let source_index = position(list, &intent.source_id)?;
    let target_index = position(list, &intent.target_id)?;

    if intent.is_noop() {
        return Ok(list.to_vec());
    }

    let mut next = list.to_vec();
    let item = next.remove(source_index);
    next.insert(target_index, item);
    for (index, item) in next.iter_mut().enumerate() {
        item.order = index as i64;
    }

    tracing::trace!(
        source_id = %intent.source_id,
        target_id = %intent.target_id,
        source_index,
        target_index,
        "[Reducer] move applied"
    );
    Ok(next)
}

/// Items of `after` whose `order` differs from `before` (the commit write set)
pub fn changed_items(before: &[OrderedItem], after: &[OrderedItem]) -> Vec<SortOrderItem> {
    let previous: HashMap<&str, i64> = before
        .iter()
        .map(|item| (item.id.as_str(), item.order))
        .collect();

    after
        .iter()
        .filter(|item| previous.get(item.id.as_str()) != Some(&item.order))
        .map(|item| SortOrderItem::new(item.id.clone(), item.order))
        .collect()
}

/// The move that puts `intent.source_id` back where it was in `before`
pub fn inverse(before: &[OrderedItem], intent: &MoveIntent) -> SyncResult<MoveIntent> {
    let source_index = position(before, &intent.source_id)?;
    let after = reduce(before, intent)?;
    Ok(MoveIntent::new(
        intent.source_id.clone(),
        after[source_index].id.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{is_contiguous, sort_items};
    use std::collections::HashSet;

    fn list(ids: &[&str]) -> Vec<OrderedItem> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| OrderedItem::new(*id, i as i64, *id).with_created_at(1))
            .collect()
    }

    fn view(items: &[OrderedItem]) -> Vec<(&str, i64)> {
        items.iter().map(|i| (i.id.as_str(), i.order)).collect()
    }

    #[test]
    fn test_move_to_front() {
        let reduced = reduce(&list(&["A", "B", "C"]), &MoveIntent::new("B", "A")).unwrap();
        assert_eq!(view(&reduced), vec![("B", 0), ("A", 1), ("C", 2)]);
    }

    #[test]
    fn test_move_to_last() {
        let reduced = reduce(&list(&["A", "B", "C"]), &MoveIntent::new("A", "C")).unwrap();
        assert_eq!(view(&reduced), vec![("B", 0), ("C", 1), ("A", 2)]);
    }

    #[test]
    fn test_noop_returns_input() {
        let mut input = list(&["A", "B", "C"]);
        input[2].order = 9;
        let reduced = reduce(&input, &MoveIntent::new("B", "B")).unwrap();
        assert_eq!(reduced, input);
    }

    #[test]
    fn test_unknown_source_is_invalid() {
        let err = reduce(&list(&["A", "B"]), &MoveIntent::new("X", "A")).unwrap_err();
        assert!(matches!(err, SyncError::InvalidMove { ref id } if id == "X"));
    }

    #[test]
    fn test_unknown_target_is_invalid() {
        let err = reduce(&list(&["A", "B"]), &MoveIntent::new("A", "Y")).unwrap_err();
        assert!(matches!(err, SyncError::InvalidMove { ref id } if id == "Y"));
    }

    #[test]
    fn test_unknown_noop_is_invalid() {
        assert!(reduce(&list(&["A"]), &MoveIntent::new("Z", "Z")).is_err());
    }

    #[test]
    fn test_every_move_is_a_contiguous_permutation() {
        let input = list(&["A", "B", "C", "D", "E"]);
        let original: HashSet<&str> = input.iter().map(|i| i.id.as_str()).collect();

        for source in &input {
            for target in &input {
                let intent = MoveIntent::new(source.id.clone(), target.id.clone());
                let reduced = reduce(&input, &intent).unwrap();
                let ids: HashSet<&str> = reduced.iter().map(|i| i.id.as_str()).collect();
                assert_eq!(reduced.len(), input.len());
                assert_eq!(ids, original);
                assert!(is_contiguous(&reduced));
            }
        }
    }

    #[test]
    fn test_reindex_closes_gaps() {
        let mut input = list(&["A", "B", "C"]);
        input[1].order = 10;
        input[2].order = 25;
        let reduced = reduce(&input, &MoveIntent::new("C", "B")).unwrap();
        assert_eq!(view(&reduced), vec![("A", 0), ("C", 1), ("B", 2)]);
    }

    #[test]
    fn test_deterministic() {
        let input = list(&["A", "B", "C", "D"]);
        let intent = MoveIntent::new("D", "B");
        assert_eq!(reduce(&input, &intent).unwrap(), reduce(&input, &intent).unwrap());
    }

    #[test]
    fn test_inverse_round_trip() {
        let input = list(&["A", "B", "C", "D", "E"]);
        for source in &input {
            for target in &input {
                let intent = MoveIntent::new(source.id.clone(), target.id.clone());
                let reduced = sort_items(reduce(&input, &intent).unwrap());
                let undo = inverse(&input, &intent).unwrap();
                let restored = sort_items(reduce(&reduced, &undo).unwrap());
                assert_eq!(view(&restored), view(&input), "move {:?}", intent);
            }
        }
    }

    #[test]
    fn test_changed_items_only_moved_range() {
        let before = list(&["A", "B", "C", "D"]);
        let after = reduce(&before, &MoveIntent::new("C", "B")).unwrap();
        let changed = changed_items(&before, &after);
        assert_eq!(
            changed,
            vec![SortOrderItem::new("C", 1), SortOrderItem::new("B", 2)]
        );
    }

    #[test]
    fn test_changed_items_empty_for_noop() {
        let before = list(&["A", "B"]);
        assert!(changed_items(&before, &before).is_empty());
    }

    #[test]
    fn test_changed_items_includes_reindexed_gaps() {
        let mut before = list(&["A", "B", "C"]);
        before[2].order = 8;
        let after = reduce(&before, &MoveIntent::new("B", "A")).unwrap();
        let changed = changed_items(&before, &after);
        assert_eq!(changed.len(), 3);
    }
}
