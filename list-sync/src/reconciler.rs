//! Reconciler: pending transaction record and settle policy
//!
//! ```text
//! commit result ──┬─ deferred remote? ── yes ─▶ Superseded (remote snapshot wins)
//!                 │
//!                 ├─ Ok / Confirmed echo ────▶ Committed
//!                 ├─ ambiguous error ────────▶ Refetch ─▶ resolve_refetch
//!                 └─ definite error ─────────▶ RolledBack (previous, verbatim)
//! ```
//!
//! A remote push that already equals `next` while committing is an echo of
//! our own write and confirms it. The echo is what gets displayed once the
//! commit settles, since it may carry edits made elsewhere; a later error
//! for the same commit is only logged. A push that repeats the pre-move list is a late echo of an
//! earlier write and carries nothing new.

use shared::error::AppError;
use shared::intent::MoveIntent;
use shared::models::{OrderedItem, SortOrderItem};

use crate::error::{SyncError, SyncResult};
use crate::order::{same_order, sort_items};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    /// Batch write in flight, no confirmation yet
    Committing,
    /// An echo equal to `next` arrived before the write resolved
    Confirmed,
}

/// What to do with a push received while committing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDecision {
    Confirm,
    /// Late echo of the state we moved away from
    Ignore,
    Defer,
}

/// One optimistic reorder awaiting its commit result
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub id: u64,
    pub intent: MoveIntent,
    /// Displayed list right before the move
    pub previous: Vec<OrderedItem>,
    /// Optimistic list being shown while committing
    pub next: Vec<OrderedItem>,
    pub write_set: Vec<SortOrderItem>,
    pub status: TxnStatus,
    /// Newest echo of our own write, as the store sent it
    pub confirmed_remote: Option<Vec<OrderedItem>>,
    /// Newest non-echo push seen while committing
    pub deferred_remote: Option<Vec<OrderedItem>>,
}

/// Final (or pending re-fetch) result of settling a transaction
#[derive(Debug, Clone)]
pub enum Resolution {
    Committed {
        items: Vec<OrderedItem>,
    },
    RolledBack {
        items: Vec<OrderedItem>,
        error: AppError,
    },
    /// Another writer's snapshot replaced the optimistic list
    Superseded {
        items: Vec<OrderedItem>,
        error: Option<AppError>,
    },
    /// Outcome unknown; the caller must re-read the store
    Refetch {
        previous: Vec<OrderedItem>,
        expected: Vec<OrderedItem>,
        error: AppError,
    },
}

impl PendingTransaction {
    pub fn new(
        id: u64,
        intent: MoveIntent,
        previous: Vec<OrderedItem>,
        next: Vec<OrderedItem>,
        write_set: Vec<SortOrderItem>,
    ) -> Self {
        Self {
            id,
            intent,
            previous,
            next,
            write_set,
            status: TxnStatus::Committing,
            confirmed_remote: None,
            deferred_remote: None,
        }
    }

    /// Classify a push that arrived mid-commit
    pub fn observe_remote(&mut self, items: Vec<OrderedItem>) -> RemoteDecision {
        if same_order(&items, &self.next) {
            tracing::debug!(txn_id = self.id, "Echo matches pending write, confirmed");
            self.status = TxnStatus::Confirmed;
            self.confirmed_remote = Some(sort_items(items));
            self.deferred_remote = None;
            RemoteDecision::Confirm
        } else if same_content(&items, &self.previous) {
            tracing::trace!(txn_id = self.id, "Push repeats the pre-move list, ignored");
            RemoteDecision::Ignore
        } else {
            tracing::debug!(txn_id = self.id, items = items.len(), "Remote push deferred until settle");
            self.deferred_remote = Some(sort_items(items));
            RemoteDecision::Defer
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == TxnStatus::Confirmed
    }

    /// Decide what the displayed list becomes once the commit resolves
    pub fn settle(self, result: SyncResult<()>) -> Resolution {
        let txn_id = self.id;
        let confirmed = self.is_confirmed();

        if let Some(remote) = self.deferred_remote {
            let conflict =
                SyncError::ConcurrentModification(format!("transaction {} superseded", txn_id));
            tracing::warn!(txn_id, error = %conflict, "Remote snapshot wins over pending write");
            let error = match result {
                Err(err) if !confirmed => Some(AppError::from(err)),
                _ => None,
            };
            return Resolution::Superseded {
                items: remote,
                error,
            };
        }

        match result {
            Ok(()) => Resolution::Committed {
                items: self.confirmed_remote.unwrap_or(self.next),
            },
            Err(err) if confirmed => {
                tracing::info!(txn_id, error = %err, "Commit error after confirmed echo, keeping write");
                Resolution::Committed {
                    items: self.confirmed_remote.unwrap_or(self.next),
                }
            }
            Err(err) if err.is_ambiguous() => Resolution::Refetch {
                previous: self.previous,
                expected: self.next,
                error: err.into(),
            },
            Err(err) => Resolution::RolledBack {
                items: self.previous,
                error: err.into(),
            },
        }
    }
}

/// Same documents, ignoring `updated_at` and input order
fn same_content(a: &[OrderedItem], b: &[OrderedItem]) -> bool {
    let normalize = |items: &[OrderedItem]| {
        let mut items: Vec<OrderedItem> = items
            .iter()
            .cloned()
            .map(|mut item| {
                item.updated_at = 0;
                item
            })
            .collect();
        items.sort_by(|x, y| x.id.cmp(&y.id));
        items
    };
    a.len() == b.len() && normalize(a) == normalize(b)
}

/// Compare a re-read after an ambiguous commit against what we tried to write
pub fn resolve_refetch(
    previous: Vec<OrderedItem>,
    expected: &[OrderedItem],
    error: AppError,
    fetched: SyncResult<Vec<OrderedItem>>,
) -> Resolution {
    match fetched {
        Ok(items) if same_order(&items, expected) => {
            tracing::info!("Re-read shows the write landed");
            Resolution::Committed {
                items: sort_items(items),
            }
        }
        Ok(items) if same_order(&items, &previous) => {
            tracing::info!("Re-read shows the write did not land");
            Resolution::RolledBack {
                items: previous,
                error,
            }
        }
        Ok(items) => {
            tracing::warn!(items = items.len(), "Re-read differs from both snapshots, adopting store");
            Resolution::Superseded {
                items: sort_items(items),
                error: Some(error),
            }
        }
        Err(fetch_err) => {
            tracing::error!(error = %fetch_err, "Re-read failed, restoring previous list");
            Resolution::RolledBack {
                items: previous,
                error,
            }
        }
    }
}

/// Snapshot to display for a push received while no commit is in flight
///
/// `None` when the push is identical to what is displayed.
pub fn reconcile_idle(
    displayed: &[OrderedItem],
    pushed: Vec<OrderedItem>,
) -> Option<Vec<OrderedItem>> {
    let pushed = sort_items(pushed);
    if pushed.as_slice() == displayed {
        None
    } else {
        Some(pushed)
    }
}
