//! Embedded document store for ordered collections
//!
//! - **storage**: redb-backed collections of JSON documents with atomic batch updates
//! - **feed**: broadcast channel of committed collection snapshots
//!
//! # Data Flow
//!
//! ```text
//! batch_update(collection, updates)
//!     ├─ 1. Begin write transaction
//!     ├─ 2. Apply every update (missing id → abort, nothing written)
//!     ├─ 3. Read back the collection snapshot
//!     ├─ 4. Increment change sequence
//!     ├─ 5. Commit
//!     └─ 6. Publish CollectionChange to subscribers
//! ```

pub mod error;
pub mod feed;
pub mod storage;

pub use error::{StoreError, StoreResult};
pub use feed::{ChangeFeed, FeedConfig};
pub use storage::{DocumentStore, StoreStats};
