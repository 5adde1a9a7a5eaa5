use doc_store::{ChangeFeed, DocumentStore, StoreError};
use shared::message::ChangeKind;
use shared::models::{ItemUpdate, OrderedItem, SortOrderItem};
use tokio::sync::broadcast::error::TryRecvError;

fn item(id: &str, order: i64) -> OrderedItem {
    OrderedItem::new(id, order, format!("Step {}", id))
}

#[tokio::test]
async fn test_committed_batch_is_published_once() {
    let store = DocumentStore::open_in_memory().unwrap();
    store.insert("diet", &item("a", 0)).unwrap();
    store.insert("diet", &item("b", 1)).unwrap();

    let mut rx = store.subscribe();
    let updates: Vec<ItemUpdate> = vec![
        SortOrderItem::new("a", 1).into(),
        SortOrderItem::new("b", 0).into(),
    ];
    store.batch_update("diet", &updates).unwrap();

    let change = rx.recv().await.unwrap();
    assert_eq!(change.collection, "diet");
    assert_eq!(change.kind, ChangeKind::BatchUpdated);
    assert_eq!(change.sequence, 3);
    let b = change.items.iter().find(|i| i.id == "b").unwrap();
    assert_eq!(b.order, 0);

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_aborted_batch_is_not_published() {
    let store = DocumentStore::open_in_memory().unwrap();
    store.insert("diet", &item("a", 0)).unwrap();

    let mut rx = store.subscribe();
    let updates: Vec<ItemUpdate> = vec![
        SortOrderItem::new("a", 1).into(),
        SortOrderItem::new("ghost", 0).into(),
    ];
    let err = store.batch_update("diet", &updates).unwrap_err();
    assert!(matches!(err, StoreError::DocumentNotFound(_, _)));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_subscribers_see_other_collections_and_filter() {
    let store = DocumentStore::open_in_memory_with_feed(ChangeFeed::with_capacity(16)).unwrap();
    let mut rx = store.subscribe();

    store.insert("visits", &item("x", 0)).unwrap();
    store.insert("diet", &item("a", 0)).unwrap();

    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    assert!(first.is_for("visits"));
    assert!(second.is_for("diet"));
    assert_eq!(second.items.len(), 1);
}

#[test]
fn test_file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lists.redb");

    {
        let store = DocumentStore::open(&path).unwrap();
        store.insert("diet", &item("a", 0)).unwrap();
        store.insert("diet", &item("b", 1)).unwrap();
        store
            .batch_update("diet", &[ItemUpdate::from(SortOrderItem::new("a", 7))])
            .unwrap();
    }

    let store = DocumentStore::open(&path).unwrap();
    assert_eq!(store.current_sequence().unwrap(), 3);
    assert_eq!(store.get("diet", "a").unwrap().unwrap().order, 7);
    assert_eq!(store.list("diet").unwrap().len(), 2);
}
