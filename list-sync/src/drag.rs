//! Drag controller: gesture stream → at most one [`MoveIntent`] per gesture
//!
//! Pointer and keyboard gestures resolve to ids, never indices, so a move
//! stays meaningful if the list re-renders between resolve and reduce.
//!
//! ```text
//! Press(id) ─▶ Over(target)* ─▶ Release ─▶ on_move(id, target)
//! Lift(id)  ─▶ Step(Up|Down)* ─▶ Drop    ─▶ on_move(id, cursor)
//!       any ─▶ Cancel                     ─▶ (nothing)
//! ```

use serde::{Deserialize, Serialize};
use shared::intent::MoveIntent;
use shared::models::OrderedItem;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDirection {
    Up,
    Down,
}

/// Input from the host's gesture layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GestureEvent {
    /// Pointer down on an item's drag handle
    Press { id: String },
    /// Pointer is over an item (`None`: outside the list)
    Over { id: Option<String> },
    /// Pointer up
    Release,
    /// Keyboard pick-up
    Lift { id: String },
    Step { direction: StepDirection },
    /// Keyboard drop at the cursor
    Drop,
    /// Escape, pointer left the window, list unmounted
    Cancel,
}

/// Receives resolved moves
pub trait MoveSink {
    fn on_move(&mut self, source_id: &str, target_id: &str);
}

impl MoveSink for mpsc::UnboundedSender<MoveIntent> {
    fn on_move(&mut self, source_id: &str, target_id: &str) {
        if self.send(MoveIntent::new(source_id, target_id)).is_err() {
            tracing::debug!(source_id, target_id, "Move dropped, receiver gone");
        }
    }
}

impl MoveSink for Vec<MoveIntent> {
    fn on_move(&mut self, source_id: &str, target_id: &str) {
        self.push(MoveIntent::new(source_id, target_id));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Gesture {
    #[default]
    Idle,
    Pointer {
        source_id: String,
        over: Option<String>,
    },
    Keyboard {
        source_id: String,
        cursor: usize,
    },
}

fn index_of(displayed: &[OrderedItem], id: &str) -> Option<usize> {
    displayed.iter().position(|item| item.id == id)
}

/// Tracks one gesture at a time
#[derive(Debug, Clone, Default)]
pub struct DragController {
    gesture: Gesture,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id being dragged, for the reduced-opacity styling
    pub fn dragging_id(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::Idle => None,
            Gesture::Pointer { source_id, .. } | Gesture::Keyboard { source_id, .. } => {
                Some(source_id)
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Keyboard cursor position, if a keyboard gesture is active
    pub fn cursor(&self) -> Option<usize> {
        match self.gesture {
            Gesture::Keyboard { cursor, .. } => Some(cursor),
            _ => None,
        }
    }

    /// Feed one event; returns the move when the gesture resolves to one
    pub fn handle(&mut self, event: GestureEvent, displayed: &[OrderedItem]) -> Option<MoveIntent> {
        match event {
            GestureEvent::Press { id } => {
                if index_of(displayed, &id).is_some() {
                    self.gesture = Gesture::Pointer {
                        source_id: id,
                        over: None,
                    };
                } else {
                    tracing::trace!(%id, "Press on unknown item ignored");
                }
                None
            }
            GestureEvent::Over { id } => {
                if let Gesture::Pointer { over, .. } = &mut self.gesture {
                    *over = id.filter(|id| index_of(displayed, id).is_some());
                }
                None
            }
            GestureEvent::Release => match std::mem::take(&mut self.gesture) {
                Gesture::Pointer {
                    source_id,
                    over: Some(target_id),
                } => Self::resolve(source_id, target_id, displayed),
                // pointer up does not end a keyboard drag
                keyboard @ Gesture::Keyboard { .. } => {
                    self.gesture = keyboard;
                    None
                }
                _ => None,
            },
            GestureEvent::Lift { id } => {
                if let Some(cursor) = index_of(displayed, &id) {
                    self.gesture = Gesture::Keyboard {
                        source_id: id,
                        cursor,
                    };
                }
                None
            }
            GestureEvent::Step { direction } => {
                if let Gesture::Keyboard { cursor, .. } = &mut self.gesture {
                    let last = displayed.len().saturating_sub(1);
                    *cursor = match direction {
                        StepDirection::Up => cursor.saturating_sub(1),
                        StepDirection::Down => (*cursor + 1).min(last),
                    };
                }
                None
            }
            GestureEvent::Drop => match std::mem::take(&mut self.gesture) {
                Gesture::Keyboard { source_id, cursor } => {
                    let target_id = displayed.get(cursor)?.id.clone();
                    Self::resolve(source_id, target_id, displayed)
                }
                other => {
                    self.gesture = other;
                    None
                }
            },
            GestureEvent::Cancel => {
                if let Some(id) = self.dragging_id() {
                    tracing::trace!(%id, "Gesture cancelled");
                }
                self.gesture = Gesture::Idle;
                None
            }
        }
    }

    /// [`DragController::handle`] and forward a resolved move to `sink`
    pub fn dispatch(
        &mut self,
        event: GestureEvent,
        displayed: &[OrderedItem],
        sink: &mut impl MoveSink,
    ) -> bool {
        match self.handle(event, displayed) {
            Some(intent) => {
                sink.on_move(&intent.source_id, &intent.target_id);
                true
            }
            None => false,
        }
    }

    fn resolve(source_id: String, target_id: String, displayed: &[OrderedItem]) -> Option<MoveIntent> {
        if source_id == target_id || index_of(displayed, &source_id).is_none() {
            return None;
        }
        Some(MoveIntent::new(source_id, target_id))
    }
}
