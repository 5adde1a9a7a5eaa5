//! Test helpers: a scriptable store wrapping the in-memory document store

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use doc_store::DocumentStore;
use list_sync::{BackingStore, SyncConfig, SyncError, SyncResult, Subscription};
use parking_lot::Mutex;
use shared::models::{ItemUpdate, OrderedItem, OrderedItemUpdate};
use tokio::sync::Notify;

pub const COLLECTION: &str = "diet";

/// Wraps [`DocumentStore`]; batch writes can be failed, gated or hung
pub struct FakeStore {
    pub inner: DocumentStore,
    fail_next: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
    hang_before_write: AtomicBool,
    hang_after_write: AtomicBool,
    batch_calls: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: DocumentStore::open_in_memory().unwrap(),
            fail_next: Mutex::new(None),
            gate: Mutex::new(None),
            hang_before_write: AtomicBool::new(false),
            hang_after_write: AtomicBool::new(false),
            batch_calls: AtomicUsize::new(0),
        })
    }

    /// Store seeded with `ids` at orders `0..n`, all created at the same instant
    pub fn seeded(ids: &[&str]) -> Arc<Self> {
        let store = Self::new();
        for (i, id) in ids.iter().enumerate() {
            store
                .inner
                .insert(COLLECTION, &OrderedItem::new(*id, i as i64, *id).with_created_at(1))
                .unwrap();
        }
        store
    }

    /// Next batch write fails with a network-style error
    pub fn fail_next_batch(&self, message: &str) {
        *self.fail_next.lock() = Some(message.to_string());
    }

    /// Next batch write waits until the returned gate is notified
    pub fn gate_next_batch(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    /// Batch writes never resolve and never land
    pub fn hang_before_write(&self) {
        self.hang_before_write.store(true, Ordering::SeqCst);
    }

    /// Batch writes land but the response never arrives
    pub fn hang_after_write(&self) {
        self.hang_after_write.store(true, Ordering::SeqCst);
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn stored_order(&self) -> Vec<(String, i64)> {
        let items = list_sync::order::sort_items(self.inner.list(COLLECTION).unwrap());
        items.into_iter().map(|i| (i.id, i.order)).collect()
    }
}

#[async_trait]
impl BackingStore for FakeStore {
    async fn fetch_all(&self, collection: &str) -> SyncResult<Vec<OrderedItem>> {
        self.inner.fetch_all(collection).await
    }

    async fn batch_write(&self, collection: &str, updates: Vec<ItemUpdate>) -> SyncResult<()> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let failure = self.fail_next.lock().take();
        if let Some(message) = failure {
            return Err(SyncError::Backend(message));
        }

        if self.hang_before_write.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        self.inner.batch_write(collection, updates).await?;

        if self.hang_after_write.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        BackingStore::subscribe(&self.inner, collection)
    }

    async fn insert(&self, collection: &str, item: OrderedItem) -> SyncResult<()> {
        BackingStore::insert(&self.inner, collection, item).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: OrderedItemUpdate,
    ) -> SyncResult<OrderedItem> {
        BackingStore::update(&self.inner, collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> SyncResult<()> {
        BackingStore::delete(&self.inner, collection, id).await
    }
}

pub fn config() -> SyncConfig {
    SyncConfig::default().with_commit_timeout_ms(2_000)
}

pub fn ids(items: &[OrderedItem]) -> Vec<&str> {
    items.iter().map(|i| i.id.as_str()).collect()
}

pub fn orders(items: &[OrderedItem]) -> Vec<(&str, i64)> {
    items.iter().map(|i| (i.id.as_str(), i.order)).collect()
}
