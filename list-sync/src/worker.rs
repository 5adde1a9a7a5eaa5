//! Sync worker - one tokio task per collection
//!
//! Serializes move intents, lifecycle actions and remote pushes for one
//! [`OrderedCollection`] and publishes a [`ListView`] after every step.
//!
//! ```text
//!  MoveSender ──mpsc──┐
//!  SyncHandle ──mpsc──┼──▶ SyncWorker ──watch──▶ ListView
//!  Subscription ──────┘        │
//!                          Committer (one commit in flight)
//! ```
//!
//! While a commit is in flight the worker keeps draining pushes into the
//! reconciler and queues (or rejects) new moves. Shutdown waits for the
//! in-flight commit to settle.

use std::collections::VecDeque;
use std::sync::Arc;

use shared::error::AppError;
use shared::intent::{ItemAction, MoveIntent};
use shared::models::OrderedItem;
use shared::util::now_millis;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::collection::{BeginMove, CommitTicket, OrderedCollection, PhaseKind, ReorderOutcome};
use crate::config::SyncConfig;
use crate::drag::MoveSink;
use crate::error::{SyncError, SyncResult};
use crate::notify::Notification;
use crate::store::{BackingStore, Subscription};

type ActionReply = oneshot::Sender<SyncResult<Option<OrderedItem>>>;

enum WorkerCommand {
    Move(MoveIntent),
    Action {
        action: ItemAction,
        reply: ActionReply,
    },
    Dismiss(u64),
}

/// What the host renders
#[derive(Debug, Clone)]
pub struct ListView {
    pub items: Vec<OrderedItem>,
    pub phase: PhaseKind,
    /// Items are an optimistic, not yet committed order
    pub provisional: bool,
    /// The pending write was already seen on the live-update channel
    pub confirmed: bool,
    pub queued: usize,
    pub notifications: Vec<Notification>,
    pub last_outcome: Option<ReorderOutcome>,
}

/// Move sink feeding a running worker
#[derive(Clone)]
pub struct MoveSender {
    tx: mpsc::UnboundedSender<WorkerCommand>,
}

impl MoveSink for MoveSender {
    fn on_move(&mut self, source_id: &str, target_id: &str) {
        if self
            .tx
            .send(WorkerCommand::Move(MoveIntent::new(source_id, target_id)))
            .is_err()
        {
            tracing::debug!(source_id, target_id, "Move dropped, worker stopped");
        }
    }
}

/// Handle to a running [`SyncWorker`]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<WorkerCommand>,
    view: watch::Receiver<ListView>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Sink for a host-side [`DragController`](crate::drag::DragController)
    pub fn sink(&self) -> MoveSender {
        MoveSender {
            tx: self.tx.clone(),
        }
    }

    pub fn submit(&self, intent: MoveIntent) -> SyncResult<()> {
        self.tx
            .send(WorkerCommand::Move(intent))
            .map_err(|_| SyncError::Backend("sync worker stopped".into()))
    }

    /// Run a lifecycle action after any in-flight commit
    pub async fn dispatch(&self, action: ItemAction) -> SyncResult<Option<OrderedItem>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(WorkerCommand::Action { action, reply })
            .map_err(|_| SyncError::Backend("sync worker stopped".into()))?;
        rx.await
            .map_err(|_| SyncError::Backend("sync worker dropped the action".into()))?
    }

    pub fn dismiss(&self, notification_id: u64) {
        let _ = self.tx.send(WorkerCommand::Dismiss(notification_id));
    }

    /// Latest published view
    pub fn view(&self) -> ListView {
        self.view.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<ListView> {
        self.view.clone()
    }

    /// Stop the worker once any in-flight commit has settled
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Sync worker task failed");
        }
    }
}

/// Owns one collection and drives it from channels
pub struct SyncWorker<S: BackingStore> {
    collection: OrderedCollection<S>,
    subscription: Subscription,
    rx: mpsc::UnboundedReceiver<WorkerCommand>,
    view_tx: watch::Sender<ListView>,
    shutdown: CancellationToken,
    last_outcome: Option<ReorderOutcome>,
    deferred_actions: VecDeque<(ItemAction, ActionReply)>,
    feed_open: bool,
    commands_open: bool,
}

impl<S: BackingStore> SyncWorker<S> {
    /// Subscribe, load and start a worker for `collection`
    pub async fn spawn(
        store: Arc<S>,
        collection: impl Into<String>,
        config: &SyncConfig,
    ) -> SyncResult<SyncHandle> {
        let collection = collection.into();
        // subscribe before the first read so no push falls in between
        let subscription = store.subscribe(&collection);
        let mut list = OrderedCollection::new(store, collection, config);
        list.load().await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let (view_tx, view) = watch::channel(Self::snapshot(&list, None));

        let worker = SyncWorker {
            collection: list,
            subscription,
            rx,
            view_tx,
            shutdown: shutdown.clone(),
            last_outcome: None,
            deferred_actions: VecDeque::new(),
            feed_open: true,
            commands_open: true,
        };
        let task = tokio::spawn(worker.run());

        Ok(SyncHandle {
            tx,
            view,
            shutdown,
            task,
        })
    }

    async fn run(mut self) {
        tracing::info!(collection = %self.collection.collection(), "SyncWorker started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!(collection = %self.collection.collection(), "SyncWorker shutting down");
                    break;
                }

                change = self.subscription.recv(), if self.feed_open => {
                    match change {
                        Some(change) => {
                            if self.collection.on_remote_change(change) {
                                self.publish();
                            }
                        }
                        None => {
                            tracing::warn!(collection = %self.collection.collection(), "Live-update channel closed");
                            self.feed_open = false;
                        }
                    }
                }

                command = self.rx.recv() => {
                    match command {
                        Some(WorkerCommand::Move(intent)) => self.process_move(intent).await,
                        Some(WorkerCommand::Action { action, reply }) => {
                            let result = self.collection.dispatch(action).await;
                            self.publish();
                            let _ = reply.send(result);
                        }
                        Some(WorkerCommand::Dismiss(id)) => {
                            self.collection.notifications_mut().dismiss(id);
                            self.publish();
                        }
                        None => {
                            tracing::debug!(collection = %self.collection.collection(), "All handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!(collection = %self.collection.collection(), "SyncWorker stopped");
    }

    /// Run a move and then every move queued behind it
    async fn process_move(&mut self, intent: MoveIntent) {
        let mut next = Some(intent);
        while let Some(intent) = next.take() {
            match self.collection.begin_move(intent) {
                Ok(BeginMove::Started(ticket)) => {
                    self.publish();
                    let outcome = self.commit_in_flight(ticket).await;
                    self.last_outcome = Some(outcome);
                }
                Ok(BeginMove::Unchanged) => self.last_outcome = Some(ReorderOutcome::Unchanged),
                Ok(BeginMove::Queued) => self.last_outcome = Some(ReorderOutcome::Queued),
                Err(err) => {
                    tracing::debug!(collection = %self.collection.collection(), error = %err, "Move not applied");
                }
            }

            self.run_deferred_actions().await;
            self.publish();

            if self.shutdown.is_cancelled() {
                let dropped = std::iter::from_fn(|| self.collection.pop_queued()).count();
                if dropped > 0 {
                    tracing::info!(dropped, "Queued moves dropped on shutdown");
                }
            } else {
                next = self.collection.pop_queued();
            }
        }
    }

    /// Await the commit while still serving pushes and commands
    async fn commit_in_flight(&mut self, ticket: CommitTicket) -> ReorderOutcome {
        let CommitTicket { txn_id, write_set } = ticket;
        let committer = self.collection.committer();
        let commit = async move { committer.commit(&write_set).await };
        tokio::pin!(commit);

        let result = loop {
            tokio::select! {
                result = &mut commit => break result,

                change = self.subscription.recv(), if self.feed_open => {
                    match change {
                        Some(change) => {
                            self.collection.on_remote_change(change);
                            self.publish();
                        }
                        None => self.feed_open = false,
                    }
                }

                command = self.rx.recv(), if self.commands_open => {
                    match command {
                        Some(WorkerCommand::Move(intent)) => {
                            if let Err(err) = self.collection.begin_move(intent) {
                                let app_err = AppError::from(err);
                                app_err.log();
                                self.collection.notifications_mut().push_error(&app_err);
                            }
                            self.publish();
                        }
                        Some(WorkerCommand::Action { action, reply }) => {
                            self.deferred_actions.push_back((action, reply));
                        }
                        Some(WorkerCommand::Dismiss(id)) => {
                            self.collection.notifications_mut().dismiss(id);
                            self.publish();
                        }
                        None => self.commands_open = false,
                    }
                }
            }
        };

        self.collection.settle(txn_id, result).await
    }

    async fn run_deferred_actions(&mut self) {
        while let Some((action, reply)) = self.deferred_actions.pop_front() {
            let result = self.collection.dispatch(action).await;
            self.publish();
            let _ = reply.send(result);
        }
    }

    fn publish(&mut self) {
        self.collection.notifications_mut().expire(now_millis());
        let view = Self::snapshot(&self.collection, self.last_outcome.clone());
        self.view_tx.send_replace(view);
    }

    fn snapshot(list: &OrderedCollection<S>, last_outcome: Option<ReorderOutcome>) -> ListView {
        ListView {
            items: list.items().to_vec(),
            phase: list.phase().kind(),
            provisional: list.is_committing(),
            confirmed: list.pending().is_some_and(|txn| txn.is_confirmed()),
            queued: list.queued_len(),
            notifications: list.notifications().active().to_vec(),
            last_outcome,
        }
    }
}
