//! Ordered collection: the single owner of a displayed list
//!
//! # Reorder state machine
//!
//! ```text
//! Idle ─▶ GestureInProgress ─▶ MoveResolved ─▶ OptimisticallyApplied ─▶ Committing
//!  ▲                                 │                                     │
//!  │                     (no-op / invalid move)                 ┌──────────┴──────────┐
//!  │                                 ▼                          ▼                     ▼
//!  └──────────────────────────────── Idle ◀──────────────── Committed            RolledBack
//!                                                               └─────────▶ Idle ◀────┘
//! ```
//!
//! While `Committing` the displayed list is provisional. A second move is
//! queued or rejected per [`BusyPolicy`]; remote pushes go to the pending
//! transaction instead of the display.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use shared::error::AppError;
use shared::intent::{CrudAction, ItemAction, MoveIntent};
use shared::message::CollectionChange;
use shared::models::{OrderedItem, OrderedItemCreate, OrderedItemUpdate, SortOrderItem};
use shared::util::new_document_id;

use crate::committer::Committer;
use crate::config::{BusyPolicy, SyncConfig};
use crate::drag::{DragController, GestureEvent};
use crate::error::{SyncError, SyncResult};
use crate::notify::NotificationCenter;
use crate::order::{compare, next_order, sort_items};
use crate::reconciler::{reconcile_idle, resolve_refetch, PendingTransaction, Resolution};
use crate::reducer::{changed_items, reduce};
use crate::store::BackingStore;

const JOURNAL_LIMIT: usize = 64;

/// Where the current reorder operation stands
#[derive(Debug, Clone, Default)]
pub enum ReorderPhase {
    #[default]
    Idle,
    GestureInProgress {
        source_id: String,
    },
    MoveResolved {
        intent: MoveIntent,
    },
    OptimisticallyApplied {
        txn_id: u64,
    },
    Committing(PendingTransaction),
    Committed {
        txn_id: u64,
    },
    RolledBack {
        txn_id: u64,
    },
}

/// Fieldless mirror of [`ReorderPhase`] for views and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    GestureInProgress,
    MoveResolved,
    OptimisticallyApplied,
    Committing,
    Committed,
    RolledBack,
}

impl ReorderPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            ReorderPhase::Idle => PhaseKind::Idle,
            ReorderPhase::GestureInProgress { .. } => PhaseKind::GestureInProgress,
            ReorderPhase::MoveResolved { .. } => PhaseKind::MoveResolved,
            ReorderPhase::OptimisticallyApplied { .. } => PhaseKind::OptimisticallyApplied,
            ReorderPhase::Committing(_) => PhaseKind::Committing,
            ReorderPhase::Committed { .. } => PhaseKind::Committed,
            ReorderPhase::RolledBack { .. } => PhaseKind::RolledBack,
        }
    }
}

/// How a move ended
#[derive(Debug, Clone)]
pub enum ReorderOutcome {
    Committed,
    /// Display restored; the error was shown as a notification
    RolledBack { error: AppError },
    /// Another writer's snapshot replaced the optimistic list
    Superseded { error: Option<AppError> },
    /// No-op move, nothing written
    Unchanged,
    /// Deferred until the in-flight commit settles
    Queued,
}

impl ReorderOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, ReorderOutcome::Committed)
    }
}

/// Write to perform for an optimistically applied move
#[derive(Debug, Clone)]
pub struct CommitTicket {
    pub txn_id: u64,
    pub write_set: Vec<SortOrderItem>,
}

#[derive(Debug, Clone)]
pub enum BeginMove {
    Unchanged,
    Queued,
    Started(CommitTicket),
}

/// Typed state container for one ordered collection
pub struct OrderedCollection<S: BackingStore> {
    collection: String,
    store: Arc<S>,
    committer: Committer<S>,
    busy_policy: BusyPolicy,
    items: Vec<OrderedItem>,
    phase: ReorderPhase,
    drag: DragController,
    queued: VecDeque<MoveIntent>,
    notifications: NotificationCenter,
    next_txn_id: u64,
    journal: Vec<PhaseKind>,
}

impl<S: BackingStore> OrderedCollection<S> {
    pub fn new(store: Arc<S>, collection: impl Into<String>, config: &SyncConfig) -> Self {
        let collection = collection.into();
        let committer = Committer::new(store.clone(), collection.clone(), config.commit_timeout());
        Self {
            collection,
            store,
            committer,
            busy_policy: config.busy_policy,
            items: Vec::new(),
            phase: ReorderPhase::Idle,
            drag: DragController::new(),
            queued: VecDeque::new(),
            notifications: NotificationCenter::new(config.notification_ttl_ms),
            next_txn_id: 1,
            journal: vec![PhaseKind::Idle],
        }
    }

    /// Fetch the collection and display it in canonical order
    pub async fn load(&mut self) -> SyncResult<&[OrderedItem]> {
        let items = self.store.fetch_all(&self.collection).await?;
        self.items = sort_items(items);
        tracing::info!(collection = %self.collection, items = self.items.len(), "Collection loaded");
        Ok(&self.items)
    }

    // ========== Accessors ==========

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Displayed list, in display order
    pub fn items(&self) -> &[OrderedItem] {
        &self.items
    }

    pub fn phase(&self) -> &ReorderPhase {
        &self.phase
    }

    pub fn is_committing(&self) -> bool {
        matches!(self.phase, ReorderPhase::Committing(_))
    }

    pub fn pending(&self) -> Option<&PendingTransaction> {
        match &self.phase {
            ReorderPhase::Committing(txn) => Some(txn),
            _ => None,
        }
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationCenter {
        &mut self.notifications
    }

    /// Recent phase transitions, oldest first
    pub fn journal(&self) -> &[PhaseKind] {
        &self.journal
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn committer(&self) -> Committer<S> {
        self.committer.clone()
    }

    // ========== Reorder ==========

    /// Feed a gesture event; returns the move once the gesture resolves
    pub fn handle_gesture(&mut self, event: GestureEvent) -> Option<MoveIntent> {
        let resolved = self.drag.handle(event, &self.items);
        if self.is_committing() {
            return resolved;
        }

        let dragging = self.drag.dragging_id().map(str::to_string);
        match (&resolved, dragging) {
            (Some(intent), _) => self.transition(ReorderPhase::MoveResolved {
                intent: intent.clone(),
            }),
            (None, Some(source_id)) => {
                if !matches!(&self.phase, ReorderPhase::GestureInProgress { source_id: s } if *s == source_id)
                {
                    self.transition(ReorderPhase::GestureInProgress { source_id });
                }
            }
            (None, None) => {
                if !matches!(self.phase, ReorderPhase::Idle) {
                    self.transition(ReorderPhase::Idle);
                }
            }
        }
        resolved
    }

    /// Reduce and optimistically apply a move, leaving the commit to the caller
    pub fn begin_move(&mut self, intent: MoveIntent) -> SyncResult<BeginMove> {
        if self.is_committing() {
            return match self.busy_policy {
                BusyPolicy::Queue => {
                    tracing::debug!(
                        collection = %self.collection,
                        source_id = %intent.source_id,
                        target_id = %intent.target_id,
                        "Commit in flight, move queued"
                    );
                    self.queued.push_back(intent);
                    Ok(BeginMove::Queued)
                }
                BusyPolicy::Reject => {
                    tracing::debug!(collection = %self.collection, "Commit in flight, move rejected");
                    Err(SyncError::Busy)
                }
            };
        }

        if !matches!(&self.phase, ReorderPhase::MoveResolved { intent: i } if *i == intent) {
            self.transition(ReorderPhase::MoveResolved {
                intent: intent.clone(),
            });
        }

        let next = match reduce(&self.items, &intent) {
            Ok(next) => next,
            Err(err) => {
                tracing::debug!(collection = %self.collection, error = %err, "Move discarded");
                self.transition(ReorderPhase::Idle);
                return Err(err);
            }
        };

        let write_set = changed_items(&self.items, &next);
        if write_set.is_empty() {
            self.transition(ReorderPhase::Idle);
            return Ok(BeginMove::Unchanged);
        }

        let txn_id = self.next_txn_id;
        self.next_txn_id += 1;

        let previous = std::mem::replace(&mut self.items, next.clone());
        self.transition(ReorderPhase::OptimisticallyApplied { txn_id });

        tracing::debug!(
            collection = %self.collection,
            txn_id,
            source_id = %intent.source_id,
            target_id = %intent.target_id,
            writes = write_set.len(),
            "Move applied optimistically"
        );

        let txn = PendingTransaction::new(txn_id, intent, previous, next, write_set.clone());
        self.transition(ReorderPhase::Committing(txn));

        Ok(BeginMove::Started(CommitTicket { txn_id, write_set }))
    }

    /// Apply the commit result of `txn_id` and return to `Idle`
    pub async fn settle(&mut self, txn_id: u64, result: SyncResult<()>) -> ReorderOutcome {
        let txn = match std::mem::take(&mut self.phase) {
            ReorderPhase::Committing(txn) if txn.id == txn_id => txn,
            other => {
                tracing::warn!(collection = %self.collection, txn_id, phase = ?other.kind(), "Settle for unknown transaction ignored");
                self.phase = other;
                return ReorderOutcome::Unchanged;
            }
        };

        let resolution = match txn.settle(result) {
            Resolution::Refetch {
                previous,
                expected,
                error,
            } => {
                tracing::info!(collection = %self.collection, txn_id, "Commit outcome unknown, re-reading store");
                let fetched = self.store.fetch_all(&self.collection).await;
                resolve_refetch(previous, &expected, error, fetched)
            }
            resolved => resolved,
        };

        let outcome = match resolution {
            Resolution::Committed { items } => {
                self.items = items;
                self.transition(ReorderPhase::Committed { txn_id });
                tracing::info!(collection = %self.collection, txn_id, "Reorder committed");
                ReorderOutcome::Committed
            }
            Resolution::RolledBack { items, error } => {
                self.items = items;
                self.notifications.push_error(&error);
                self.transition(ReorderPhase::RolledBack { txn_id });
                tracing::warn!(collection = %self.collection, txn_id, code = %error.code, "Reorder rolled back");
                ReorderOutcome::RolledBack { error }
            }
            Resolution::Superseded { items, error } => {
                self.items = items;
                match &error {
                    Some(err) => {
                        self.notifications.push_error(err);
                        self.transition(ReorderPhase::RolledBack { txn_id });
                    }
                    None => self.transition(ReorderPhase::Committed { txn_id }),
                }
                tracing::warn!(collection = %self.collection, txn_id, "Reorder superseded by remote snapshot");
                ReorderOutcome::Superseded { error }
            }
            Resolution::Refetch { previous, error, .. } => {
                // resolve_refetch never yields Refetch
                self.items = previous;
                self.notifications.push_error(&error);
                self.transition(ReorderPhase::RolledBack { txn_id });
                ReorderOutcome::RolledBack { error }
            }
        };

        self.transition(ReorderPhase::Idle);
        outcome
    }

    /// Reduce, commit and settle one move, then run any queued moves
    pub async fn move_item(&mut self, intent: MoveIntent) -> SyncResult<ReorderOutcome> {
        let outcome = self.run_move(intent).await?;
        while let Some(queued) = self.pop_queued() {
            if let Err(err) = self.run_move(queued).await {
                tracing::debug!(collection = %self.collection, error = %err, "Queued move dropped");
            }
        }
        Ok(outcome)
    }

    async fn run_move(&mut self, intent: MoveIntent) -> SyncResult<ReorderOutcome> {
        match self.begin_move(intent)? {
            BeginMove::Unchanged => Ok(ReorderOutcome::Unchanged),
            BeginMove::Queued => Ok(ReorderOutcome::Queued),
            BeginMove::Started(ticket) => {
                let result = self.committer.commit(&ticket.write_set).await;
                Ok(self.settle(ticket.txn_id, result).await)
            }
        }
    }

    /// Next queued move, once no commit is in flight
    pub fn pop_queued(&mut self) -> Option<MoveIntent> {
        if self.is_committing() {
            return None;
        }
        self.queued.pop_front()
    }

    /// Handle a live-update push. Returns whether the display changed.
    pub fn on_remote_change(&mut self, change: CollectionChange) -> bool {
        if !change.is_for(&self.collection) {
            return false;
        }

        if let ReorderPhase::Committing(txn) = &mut self.phase {
            txn.observe_remote(change.items);
            return false;
        }

        match reconcile_idle(&self.items, change.items) {
            Some(items) => {
                tracing::debug!(
                    collection = %self.collection,
                    sequence = change.sequence,
                    kind = %change.kind,
                    items = items.len(),
                    "Remote snapshot adopted"
                );
                self.items = items;
                true
            }
            None => false,
        }
    }

    // ========== Item lifecycle ==========

    /// Append a new item at `max(order) + 1`
    pub async fn create_item(&mut self, data: OrderedItemCreate) -> SyncResult<OrderedItem> {
        if data.title.trim().is_empty() {
            return Err(SyncError::Validation("title must not be empty".into()));
        }

        let order = match self.pending() {
            Some(txn) => next_order(&self.items).max(next_order(&txn.previous)),
            None => next_order(&self.items),
        };
        let item = OrderedItem::from_create(new_document_id(), order, data);
        self.store.insert(&self.collection, item.clone()).await?;

        tracing::info!(collection = %self.collection, id = %item.id, order, "Item created");
        let inserted = item.clone();
        self.edit_snapshots(|items| {
            items.retain(|existing| existing.id != inserted.id);
            items.push(inserted.clone());
            items.sort_by(compare);
        });
        Ok(item)
    }

    /// Update an item's payload. `order` only changes through moves.
    pub async fn update_item(
        &mut self,
        id: &str,
        fields: OrderedItemUpdate,
    ) -> SyncResult<OrderedItem> {
        if fields.order.is_some() {
            return Err(SyncError::Validation(
                "order can only be changed by moving the item".into(),
            ));
        }
        if fields.is_empty() {
            return Err(SyncError::Validation("no fields to update".into()));
        }

        let updated = self.store.update(&self.collection, id, fields).await?;
        tracing::info!(collection = %self.collection, id, "Item updated");
        let replacement = updated.clone();
        self.edit_snapshots(|items| {
            if let Some(slot) = items.iter_mut().find(|item| item.id == replacement.id) {
                let order = slot.order;
                *slot = replacement.clone();
                slot.order = order;
            }
        });
        Ok(updated)
    }

    /// Delete an item; remaining `order` values keep their gaps
    pub async fn delete_item(&mut self, id: &str) -> SyncResult<()> {
        self.store.delete(&self.collection, id).await?;
        tracing::info!(collection = %self.collection, id, "Item deleted");
        self.edit_snapshots(|items| items.retain(|item| item.id != id));
        Ok(())
    }

    /// Run a lifecycle action
    pub async fn dispatch(&mut self, action: ItemAction) -> SyncResult<Option<OrderedItem>> {
        match action {
            CrudAction::Create(data) => self.create_item(data).await.map(Some),
            CrudAction::Update { id, data } => self.update_item(&id, data).await.map(Some),
            CrudAction::Delete { id } => self.delete_item(&id).await.map(|_| None),
        }
    }

    /// Apply a lifecycle edit to the display and to both snapshots of a
    /// pending transaction, so a rollback keeps it
    fn edit_snapshots(&mut self, edit: impl Fn(&mut Vec<OrderedItem>)) {
        edit(&mut self.items);
        if let ReorderPhase::Committing(txn) = &mut self.phase {
            edit(&mut txn.previous);
            edit(&mut txn.next);
            if let Some(echo) = txn.confirmed_remote.as_mut() {
                edit(echo);
            }
        }
    }

    fn transition(&mut self, phase: ReorderPhase) {
        let from = self.phase.kind();
        let to = phase.kind();
        tracing::trace!(collection = %self.collection, ?from, ?to, "Phase transition");
        self.phase = phase;
        self.journal.push(to);
        if self.journal.len() > JOURNAL_LIMIT {
            self.journal.remove(0);
        }
    }
}
