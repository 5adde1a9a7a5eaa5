//! SyncWorker end to end: gestures in, views out

mod common;

use std::time::Duration;

use common::{COLLECTION, FakeStore, config, ids};
use list_sync::{
    DragController, GestureEvent, ListView, PhaseKind, ReorderOutcome, SyncHandle, SyncWorker,
};
use shared::intent::{CrudAction, MoveIntent};
use shared::message::{ChangeKind, CollectionChange};
use shared::models::{OrderedItem, OrderedItemCreate};

async fn wait_for(handle: &SyncHandle, mut pred: impl FnMut(&ListView) -> bool) -> ListView {
    let mut rx = handle.watch();
    let view = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|v| pred(v)))
        .await
        .expect("timed out waiting for view")
        .expect("worker stopped");
    ListView::clone(&view)
}

fn settled(view: &ListView) -> bool {
    !view.provisional && view.phase == PhaseKind::Idle && view.last_outcome.is_some()
}

#[tokio::test]
async fn test_drag_through_sink_commits() {
    let store = FakeStore::seeded(&["A", "B", "C"]);
    let handle = SyncWorker::spawn(store.clone(), COLLECTION, &config())
        .await
        .unwrap();

    let items = handle.view().items;
    let mut drag = DragController::new();
    let mut sink = handle.sink();
    drag.dispatch(GestureEvent::Press { id: "B".into() }, &items, &mut sink);
    drag.dispatch(
        GestureEvent::Over {
            id: Some("A".into()),
        },
        &items,
        &mut sink,
    );
    assert!(drag.dispatch(GestureEvent::Release, &items, &mut sink));

    let view = wait_for(&handle, settled).await;
    assert!(matches!(view.last_outcome, Some(ReorderOutcome::Committed)));
    assert_eq!(ids(&view.items), vec!["B", "A", "C"]);
    assert_eq!(
        store.stored_order(),
        vec![("B".into(), 0), ("A".into(), 1), ("C".into(), 2)]
    );

    handle.shutdown().await;
}

#[tokio::test]
async fn test_remote_insert_shows_up_while_idle() {
    let store = FakeStore::seeded(&["A", "B"]);
    let handle = SyncWorker::spawn(store.clone(), COLLECTION, &config())
        .await
        .unwrap();

    store
        .inner
        .insert(COLLECTION, &OrderedItem::new("C", 2, "from another tab"))
        .unwrap();

    let view = wait_for(&handle, |v| v.items.len() == 3).await;
    assert_eq!(ids(&view.items), vec!["A", "B", "C"]);
    assert!(view.last_outcome.is_none());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_echo_mid_commit_is_confirmation() {
    let store = FakeStore::seeded(&["A", "B", "C"]);
    let handle = SyncWorker::spawn(store.clone(), COLLECTION, &config())
        .await
        .unwrap();

    let gate = store.gate_next_batch();
    handle.submit(MoveIntent::new("C", "A")).unwrap();
    let view = wait_for(&handle, |v| v.provisional).await;
    assert_eq!(ids(&view.items), vec!["C", "A", "B"]);

    // a push already reflecting the pending write
    store.inner.feed().publish(CollectionChange {
        collection: COLLECTION.into(),
        sequence: 100,
        kind: ChangeKind::BatchUpdated,
        items: view.items.clone(),
    });
    wait_for(&handle, |v| v.confirmed).await;

    gate.notify_one();
    let view = wait_for(&handle, settled).await;
    assert!(matches!(view.last_outcome, Some(ReorderOutcome::Committed)));
    assert_eq!(ids(&view.items), vec!["C", "A", "B"]);
    assert!(view.notifications.is_empty());

    handle.shutdown().await;
}

#[tokio::test]
async fn test_move_during_commit_is_queued() {
    let store = FakeStore::seeded(&["A", "B", "C"]);
    let handle = SyncWorker::spawn(store.clone(), COLLECTION, &config())
        .await
        .unwrap();

    let gate = store.gate_next_batch();
    handle.submit(MoveIntent::new("C", "A")).unwrap();
    wait_for(&handle, |v| v.provisional).await;

    handle.submit(MoveIntent::new("A", "B")).unwrap();
    let view = wait_for(&handle, |v| v.queued == 1).await;
    assert_eq!(ids(&view.items), vec!["C", "A", "B"]);

    gate.notify_one();
    let view = wait_for(&handle, |v| {
        !v.provisional && v.queued == 0 && ids(&v.items) == vec!["C", "B", "A"]
    })
    .await;
    assert!(view.notifications.is_empty());
    assert_eq!(store.batch_calls(), 2);
    assert_eq!(
        store.stored_order(),
        vec![("C".into(), 0), ("B".into(), 1), ("A".into(), 2)]
    );

    handle.shutdown().await;
}

#[tokio::test]
async fn test_failed_commit_raises_dismissible_notification() {
    let store = FakeStore::seeded(&["A", "B", "C"]);
    let handle = SyncWorker::spawn(store.clone(), COLLECTION, &config())
        .await
        .unwrap();
    let before = handle.view().items;

    store.fail_next_batch("quota exceeded");
    handle.submit(MoveIntent::new("C", "A")).unwrap();

    let view = wait_for(&handle, settled).await;
    assert!(matches!(
        view.last_outcome,
        Some(ReorderOutcome::RolledBack { .. })
    ));
    assert_eq!(view.items, before);
    assert_eq!(view.notifications.len(), 1);

    handle.dismiss(view.notifications[0].id);
    wait_for(&handle, |v| v.notifications.is_empty()).await;

    handle.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_waits_for_in_flight_commit() {
    let store = FakeStore::seeded(&["A", "B"]);
    let handle = SyncWorker::spawn(store.clone(), COLLECTION, &config())
        .await
        .unwrap();

    let gate = store.gate_next_batch();
    handle.submit(MoveIntent::new("B", "A")).unwrap();
    wait_for(&handle, |v| v.provisional).await;

    let shutdown = tokio::spawn(handle.shutdown());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!shutdown.is_finished());

    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(5), shutdown)
        .await
        .expect("shutdown did not finish")
        .unwrap();
    assert_eq!(
        store.stored_order(),
        vec![("B".into(), 0), ("A".into(), 1)]
    );
}

#[tokio::test]
async fn test_lifecycle_action_through_handle() {
    let store = FakeStore::seeded(&["A"]);
    let handle = SyncWorker::spawn(store.clone(), COLLECTION, &config())
        .await
        .unwrap();

    let created = handle
        .dispatch(CrudAction::Create(OrderedItemCreate {
            title: "Drink water".into(),
            body: None,
        }))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.order, 1);

    let view = wait_for(&handle, |v| v.items.len() == 2).await;
    assert_eq!(view.items[1].title, "Drink water");

    handle.shutdown().await;
}
