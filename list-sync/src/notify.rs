//! Transient, dismissible notifications (toasts)

use serde::Serialize;
use shared::error::{AppError, ErrorCategory, ErrorCode};
use shared::util::now_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub code: ErrorCode,
    pub message: String,
    pub created_at: i64,
}

/// Active toasts of one list
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    active: Vec<Notification>,
    next_id: u64,
    ttl_ms: i64,
    raised: u64,
}

impl NotificationCenter {
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            active: Vec::new(),
            next_id: 1,
            ttl_ms: ttl_ms as i64,
            raised: 0,
        }
    }

    /// Raise a toast for `err`; system errors keep their message off screen
    pub fn push_error(&mut self, err: &AppError) -> u64 {
        let message = match err.category() {
            ErrorCategory::System => ErrorCode::InternalError.message().to_string(),
            _ => err.message.clone(),
        };
        self.push(NotificationLevel::Error, err.code, message)
    }

    pub fn push(&mut self, level: NotificationLevel, code: ErrorCode, message: String) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.raised += 1;
        tracing::debug!(id, %code, %message, "Notification raised");
        self.active.push(Notification {
            id,
            level,
            code,
            message,
            created_at: now_millis(),
        });
        id
    }

    /// Returns whether a toast with this id was showing
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.active.len();
        self.active.retain(|n| n.id != id);
        before != self.active.len()
    }

    /// Drop toasts older than the ttl
    pub fn expire(&mut self, now: i64) {
        let ttl = self.ttl_ms;
        self.active.retain(|n| now - n.created_at < ttl);
    }

    pub fn active(&self) -> &[Notification] {
        &self.active
    }

    /// Toasts raised since creation, dismissed ones included
    pub fn total_raised(&self) -> u64 {
        self.raised
    }
}
