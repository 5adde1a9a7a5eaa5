//! Change feed - live-update channel of the document store
//!
//! # Architecture
//!
//! ```text
//! DocumentStore::batch_update ──commit──▶ ChangeFeed::publish
//!                                              │
//!                          broadcast::Sender<CollectionChange>
//!                                              │
//!                    ┌─────────────────────────┼──────────────────────┐
//!                    ▼                         ▼                      ▼
//!              subscriber A              subscriber B           subscriber C
//!          (filters its collection)
//! ```
//!
//! Publishing happens only after a successful commit, so an aborted batch is
//! never observed by subscribers.

use shared::message::CollectionChange;
use tokio::sync::broadcast;

/// Configuration for the change feed
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Capacity of the broadcast channel (default: 256)
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Broadcast channel of committed collection snapshots
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<CollectionChange>,
    config: FeedConfig,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::from_config(FeedConfig::default())
    }

    pub fn from_config(config: FeedConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity.max(1));
        Self { tx, config }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_config(FeedConfig {
            channel_capacity: capacity,
        })
    }

    /// Publish a change to every current subscriber.
    ///
    /// Returns the number of receivers; no subscribers is not an error.
    pub fn publish(&self, change: CollectionChange) -> usize {
        let collection = change.collection.clone();
        let sequence = change.sequence;
        match self.tx.send(change) {
            Ok(n) => {
                tracing::debug!(%collection, sequence, receivers = n, "Change published");
                n
            }
            Err(_) => {
                tracing::trace!(%collection, sequence, "Change dropped, no subscribers");
                0
            }
        }
    }

    /// Subscribe to all collections; filter with [`CollectionChange::is_for`]
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionChange> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.config.channel_capacity
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
