//! Backing store contract
//!
//! The sync engine only talks to storage through [`BackingStore`]. The
//! embedded [`DocumentStore`] implements it; tests wrap it in fakes that fail
//! or stall on demand.

use std::sync::Arc;

use async_trait::async_trait;
use doc_store::{ChangeFeed, DocumentStore};
use shared::message::CollectionChange;
use shared::models::{ItemUpdate, OrderedItem, OrderedItemUpdate};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

/// Remote document collection holding the persisted items
#[async_trait]
pub trait BackingStore: Send + Sync + 'static {
    /// Every item of the collection, in no particular order
    async fn fetch_all(&self, collection: &str) -> SyncResult<Vec<OrderedItem>>;

    /// Atomic multi-document update: all entries land or none do
    async fn batch_write(&self, collection: &str, updates: Vec<ItemUpdate>) -> SyncResult<()>;

    /// Live-update channel for one collection, echoes of our own writes included
    fn subscribe(&self, collection: &str) -> Subscription;

    async fn insert(&self, collection: &str, item: OrderedItem) -> SyncResult<()>;

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: OrderedItemUpdate,
    ) -> SyncResult<OrderedItem>;

    async fn delete(&self, collection: &str, id: &str) -> SyncResult<()>;
}

/// Subscription to one collection's pushes
///
/// Dropping it (or calling [`Subscription::unsubscribe`]) ends the channel.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    rx: broadcast::Receiver<CollectionChange>,
}

impl Subscription {
    pub fn new(collection: impl Into<String>, rx: broadcast::Receiver<CollectionChange>) -> Self {
        Self {
            collection: collection.into(),
            rx,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Next push for this collection, `None` once the store is gone
    ///
    /// Lagging is not fatal: every push carries a full snapshot, so skipping
    /// to the newest one loses nothing.
    pub async fn recv(&mut self) -> Option<CollectionChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.is_for(&self.collection) => return Some(change),
                Ok(_) => continue,
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(collection = %self.collection, skipped = n, "Subscription lagged");
                }
                Err(RecvError::Closed) => {
                    tracing::debug!(collection = %self.collection, "Subscription closed");
                    return None;
                }
            }
        }
    }

    /// Non-blocking variant of [`Subscription::recv`]
    pub fn try_recv(&mut self) -> Option<CollectionChange> {
        loop {
            match self.rx.try_recv() {
                Ok(change) if change.is_for(&self.collection) => return Some(change),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(n)) => {
                    tracing::warn!(collection = %self.collection, skipped = n, "Subscription lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        tracing::debug!(collection = %self.collection, "Unsubscribed");
    }
}

#[async_trait]
impl BackingStore for DocumentStore {
    async fn fetch_all(&self, collection: &str) -> SyncResult<Vec<OrderedItem>> {
        Ok(self.list(collection)?)
    }

    async fn batch_write(&self, collection: &str, updates: Vec<ItemUpdate>) -> SyncResult<()> {
        self.batch_update(collection, &updates)?;
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        Subscription::new(collection, DocumentStore::subscribe(self))
    }

    async fn insert(&self, collection: &str, item: OrderedItem) -> SyncResult<()> {
        DocumentStore::insert(self, collection, &item)?;
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: OrderedItemUpdate,
    ) -> SyncResult<OrderedItem> {
        Ok(DocumentStore::update(self, collection, id, fields)?)
    }

    async fn delete(&self, collection: &str, id: &str) -> SyncResult<()> {
        DocumentStore::delete(self, collection, id)?;
        Ok(())
    }
}

/// Open the file-backed store named by the config
pub fn open_document_store(config: &SyncConfig) -> SyncResult<Arc<DocumentStore>> {
    if let Some(parent) = config.db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            SyncError::Backend(format!(
                "Failed to create data directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let feed = ChangeFeed::with_capacity(config.channel_capacity);
    let store = DocumentStore::open_with_feed(&config.db_path, feed)?;
    tracing::info!(path = %config.db_path.display(), "Document store opened");
    Ok(Arc::new(store))
}
