//! Drag-to-reorder lists with optimistic updates and rollback
//!
//! - **order**: canonical sort of an ordered collection
//! - **drag**: gesture stream → move intent
//! - **reducer**: pure array-move with contiguous reindex
//! - **committer**: one atomic batch write per move
//! - **reconciler**: pending transaction, echo detection, rollback policy
//! - **collection**: typed state container driving the reorder state machine
//! - **worker**: tokio task serializing moves and live updates per collection
//!
//! # Move Flow
//!
//! ```text
//! GestureEvent ─▶ DragController ─▶ MoveIntent
//!     │
//!     ▼
//! OrderedCollection::begin_move
//!     ├─ 1. reduce(items, intent)            (InvalidMove → discard)
//!     ├─ 2. changed_items → write set        (empty → Unchanged)
//!     ├─ 3. display next, keep previous      (PendingTransaction)
//!     ▼
//! Committer::commit ── batch_write ──▶ BackingStore
//!     │
//!     ▼
//! OrderedCollection::settle
//!     ├─ Ok / echo confirmed → Committed
//!     ├─ definite failure    → RolledBack (previous, one notification)
//!     ├─ timeout             → re-read store and compare
//!     └─ remote push seen    → remote snapshot wins
//! ```

pub mod collection;
pub mod committer;
pub mod config;
pub mod drag;
pub mod error;
pub mod logger;
pub mod notify;
pub mod order;
pub mod reconciler;
pub mod reducer;
pub mod store;
pub mod worker;

pub use collection::{
    BeginMove, CommitTicket, OrderedCollection, PhaseKind, ReorderOutcome, ReorderPhase,
};
pub use committer::Committer;
pub use config::{BusyPolicy, SyncConfig};
pub use drag::{DragController, GestureEvent, MoveSink, StepDirection};
pub use error::{SyncError, SyncResult};
pub use logger::{init_logger, init_logger_with_file, setup_environment};
pub use notify::{Notification, NotificationCenter, NotificationLevel};
pub use reconciler::{PendingTransaction, Resolution, TxnStatus};
pub use store::{open_document_store, BackingStore, Subscription};
pub use worker::{ListView, MoveSender, SyncHandle, SyncWorker};
