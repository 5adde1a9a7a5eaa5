//! redb-based document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `documents` | `(collection, id)` | `OrderedItem` (JSON) | Document bodies |
//! | `sequence_counter` | `"seq"` | `u64` | Store-wide change sequence |
//!
//! # Atomicity
//!
//! Every mutating call runs in a single write transaction. A batch that
//! references a missing document returns before `commit()`, the transaction
//! is dropped and redb discards it, so either every update lands or none do.
//! Changes are published on the [`ChangeFeed`] only after the commit returns.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::message::{ChangeKind, CollectionChange};
use shared::models::{ItemUpdate, OrderedItem, OrderedItemUpdate};
use shared::util::now_millis;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::error::{StoreError, StoreResult};
use crate::feed::ChangeFeed;

/// Documents: key = (collection, id), value = JSON-serialized OrderedItem
const DOCUMENTS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("documents");

/// Sequence counter: key = "seq", value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const SEQUENCE_KEY: &str = "seq";

/// Store statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub documents: u64,
    pub sequence: u64,
}

/// Document store backed by redb
#[derive(Clone)]
pub struct DocumentStore {
    db: Arc<Database>,
    feed: ChangeFeed,
}

impl DocumentStore {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the batch is on disk, and the copy-on-write pointer swap keeps
    /// the file consistent across crashes.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_feed(path, ChangeFeed::new())
    }

    pub fn open_with_feed(path: impl AsRef<Path>, feed: ChangeFeed) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db, feed)
    }

    /// Open an in-memory database (tests, ephemeral lists)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_in_memory_with_feed(ChangeFeed::new())
    }

    pub fn open_in_memory_with_feed(feed: ChangeFeed) -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db, feed)
    }

    fn init(db: Database, feed: ChangeFeed) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(SEQUENCE_KEY)?.is_none() {
                seq_table.insert(SEQUENCE_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            feed,
        })
    }

    // ========== Change Feed ==========

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Subscribe to committed changes of every collection
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.feed.subscribe()
    }

    // ========== Sequence ==========

    fn increment_sequence(txn: &WriteTransaction) -> StoreResult<u64> {
        let mut table = txn.open_table(SEQUENCE_TABLE)?;
        let current = table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(SEQUENCE_KEY, next)?;
        Ok(next)
    }

    /// Get current sequence (read-only)
    pub fn current_sequence(&self) -> StoreResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SEQUENCE_TABLE)?;
        Ok(table
            .get(SEQUENCE_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0))
    }

    // ========== Reads ==========

    /// All documents of a collection, in key order (not display order)
    pub fn list(&self, collection: &str) -> StoreResult<Vec<OrderedItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        collect_collection(&table, collection)
    }

    pub fn get(&self, collection: &str, id: &str) -> StoreResult<Option<OrderedItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        let item = table
            .get((collection, id))?
            .map(|guard| serde_json::from_slice::<OrderedItem>(guard.value()))
            .transpose()?;
        Ok(item)
    }

    pub fn stats(&self) -> StoreResult<StoreStats> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        Ok(StoreStats {
            documents: table.len()?,
            sequence: self.current_sequence()?,
        })
    }

    // ========== Writes ==========

    /// Insert a new document. Fails if the id is already taken.
    pub fn insert(&self, collection: &str, item: &OrderedItem) -> StoreResult<CollectionChange> {
        let txn = self.db.begin_write()?;
        let items = {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            if table.get((collection, item.id.as_str()))?.is_some() {
                return Err(StoreError::DocumentExists(
                    collection.to_string(),
                    item.id.clone(),
                ));
            }
            let value = serde_json::to_vec(item)?;
            table.insert((collection, item.id.as_str()), value.as_slice())?;
            collect_collection(&table, collection)?
        };
        let sequence = Self::increment_sequence(&txn)?;
        txn.commit()?;

        tracing::debug!(collection, id = %item.id, order = item.order, "Document inserted");
        Ok(self.publish(collection, sequence, ChangeKind::Inserted, items))
    }

    /// Update one document's fields
    pub fn update(
        &self,
        collection: &str,
        id: &str,
        fields: OrderedItemUpdate,
    ) -> StoreResult<OrderedItem> {
        let updates = [ItemUpdate {
            id: id.to_string(),
            fields,
        }];
        let change = self.write_updates(collection, &updates, ChangeKind::Updated)?;
        change
            .items
            .into_iter()
            .find(|item| item.id == id)
            .ok_or_else(|| StoreError::DocumentNotFound(collection.to_string(), id.to_string()))
    }

    /// Atomic multi-document update: every entry lands or none do
    pub fn batch_update(
        &self,
        collection: &str,
        updates: &[ItemUpdate],
    ) -> StoreResult<CollectionChange> {
        if updates.is_empty() {
            return Ok(CollectionChange {
                collection: collection.to_string(),
                sequence: self.current_sequence()?,
                kind: ChangeKind::BatchUpdated,
                items: self.list(collection)?,
            });
        }
        self.write_updates(collection, updates, ChangeKind::BatchUpdated)
    }

    fn write_updates(
        &self,
        collection: &str,
        updates: &[ItemUpdate],
        kind: ChangeKind,
    ) -> StoreResult<CollectionChange> {
        let now = now_millis();
        let txn = self.db.begin_write()?;
        let items = {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            for update in updates {
                let existing = table
                    .get((collection, update.id.as_str()))?
                    .map(|guard| serde_json::from_slice::<OrderedItem>(guard.value()))
                    .transpose()?;
                let Some(mut item) = existing else {
                    tracing::warn!(collection, id = %update.id, "Batch aborted, document missing");
                    return Err(StoreError::DocumentNotFound(
                        collection.to_string(),
                        update.id.clone(),
                    ));
                };
                update.fields.apply_to(&mut item);
                item.updated_at = now;
                let value = serde_json::to_vec(&item)?;
                table.insert((collection, update.id.as_str()), value.as_slice())?;
            }
            collect_collection(&table, collection)?
        };
        let sequence = Self::increment_sequence(&txn)?;
        txn.commit()?;

        tracing::debug!(collection, writes = updates.len(), sequence, "Batch committed");
        Ok(self.publish(collection, sequence, kind, items))
    }

    /// Delete a document. Remaining `order` values are left as they are.
    pub fn delete(&self, collection: &str, id: &str) -> StoreResult<CollectionChange> {
        let txn = self.db.begin_write()?;
        let items = {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            let removed = table.remove((collection, id))?.is_some();
            if !removed {
                return Err(StoreError::DocumentNotFound(
                    collection.to_string(),
                    id.to_string(),
                ));
            }
            collect_collection(&table, collection)?
        };
        let sequence = Self::increment_sequence(&txn)?;
        txn.commit()?;

        tracing::debug!(collection, id, "Document deleted");
        Ok(self.publish(collection, sequence, ChangeKind::Deleted, items))
    }

    fn publish(
        &self,
        collection: &str,
        sequence: u64,
        kind: ChangeKind,
        items: Vec<OrderedItem>,
    ) -> CollectionChange {
        let change = CollectionChange {
            collection: collection.to_string(),
            sequence,
            kind,
            items,
        };
        self.feed.publish(change.clone());
        change
    }
}

/// Read every document of one collection from an open table
fn collect_collection(
    table: &impl ReadableTable<(&'static str, &'static str), &'static [u8]>,
    collection: &str,
) -> StoreResult<Vec<OrderedItem>> {
    let mut items = Vec::new();
    for result in table.range((collection, "")..)? {
        let (key, value) = result?;
        if key.value().0 != collection {
            break;
        }
        items.push(serde_json::from_slice(value.value())?);
    }
    Ok(items)
}
