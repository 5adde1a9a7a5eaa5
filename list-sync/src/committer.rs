//! Persistence committer
//!
//! One reorder = one batch write. The committer never retries: a failed
//! commit is reported once and the user decides whether to drag again.

use std::sync::Arc;
use std::time::Duration;

use shared::models::{ItemUpdate, SortOrderItem};

use crate::error::{SyncError, SyncResult};
use crate::store::BackingStore;

/// Writes the changed `order` values of one move as a single batch
pub struct Committer<S: BackingStore> {
    store: Arc<S>,
    collection: String,
    timeout: Duration,
}

impl<S: BackingStore> Clone for Committer<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            collection: self.collection.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: BackingStore> Committer<S> {
    pub fn new(store: Arc<S>, collection: impl Into<String>, timeout: Duration) -> Self {
        Self {
            store,
            collection: collection.into(),
            timeout,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Persist `write_set` atomically
    ///
    /// - empty write set: resolves without touching the store
    /// - store failure: `Persistence { ambiguous: false }`
    /// - timeout: `Persistence { ambiguous: true }`, the write may have landed
    pub async fn commit(&self, write_set: &[SortOrderItem]) -> SyncResult<()> {
        if write_set.is_empty() {
            tracing::debug!(collection = %self.collection, "Empty write set, nothing to commit");
            return Ok(());
        }

        let updates: Vec<ItemUpdate> = write_set.iter().map(ItemUpdate::from).collect();
        let writes = updates.len();

        match tokio::time::timeout(self.timeout, self.store.batch_write(&self.collection, updates))
            .await
        {
            Ok(Ok(())) => {
                tracing::debug!(collection = %self.collection, writes, "Batch write committed");
                Ok(())
            }
            Ok(Err(err)) => {
                tracing::error!(collection = %self.collection, writes, error = %err, "Batch write failed");
                Err(match err {
                    SyncError::Persistence { .. } => err,
                    other => SyncError::persistence(other.to_string()),
                })
            }
            Err(_) => {
                tracing::warn!(
                    collection = %self.collection,
                    writes,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Batch write timed out, outcome unknown"
                );
                Err(SyncError::ambiguous(format!(
                    "batch write timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_store::DocumentStore;
    use shared::models::OrderedItem;

    async fn seeded(ids: &[&str]) -> Arc<DocumentStore> {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        for (i, id) in ids.iter().enumerate() {
            BackingStore::insert(store.as_ref(), "diet", OrderedItem::new(*id, i as i64, *id))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_empty_write_set_skips_store() {
        let store = seeded(&["a"]).await;
        let committer = Committer::new(store.clone(), "diet", Duration::from_secs(1));
        let before = store.current_sequence().unwrap();
        committer.commit(&[]).await.unwrap();
        assert_eq!(store.current_sequence().unwrap(), before);
    }

    #[tokio::test]
    async fn test_commit_writes_orders() {
        let store = seeded(&["a", "b"]).await;
        let committer = Committer::new(store.clone(), "diet", Duration::from_secs(1));
        committer
            .commit(&[SortOrderItem::new("a", 1), SortOrderItem::new("b", 0)])
            .await
            .unwrap();
        assert_eq!(store.get("diet", "b").unwrap().unwrap().order, 0);
        assert_eq!(store.get("diet", "a").unwrap().unwrap().order, 1);
    }

    #[tokio::test]
    async fn test_store_error_becomes_definite_persistence_error() {
        let store = seeded(&["a"]).await;
        let committer = Committer::new(store.clone(), "diet", Duration::from_secs(1));
        let err = committer
            .commit(&[SortOrderItem::new("a", 3), SortOrderItem::new("gone", 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Persistence { ambiguous: false, .. }));
        assert_eq!(store.get("diet", "a").unwrap().unwrap().order, 0);
    }
}
