//! Sync configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{SyncError, SyncResult};

/// What to do with a move that arrives while a commit is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusyPolicy {
    /// Defer until the in-flight commit settles, then re-validate and run
    #[default]
    Queue,
    /// Refuse with [`SyncError::Busy`]
    Reject,
}

impl FromStr for BusyPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "reject" => Ok(Self::Reject),
            other => Err(SyncError::Config(format!("unknown busy policy: {}", other))),
        }
    }
}

/// Sync configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | LIST_SYNC_DB_PATH | ./data/list-sync.redb | store file |
/// | LIST_SYNC_COMMIT_TIMEOUT_MS | 10000 | commit timeout (ambiguous failure) |
/// | LIST_SYNC_CHANNEL_CAPACITY | 256 | change feed capacity |
/// | LIST_SYNC_BUSY_POLICY | queue | `queue` or `reject` |
/// | LIST_SYNC_NOTIFICATION_TTL_MS | 5000 | toast auto-dismiss window |
/// | LOG_LEVEL | info | logger level |
/// | LOG_DIR | (unset) | rolling file logs |
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub db_path: PathBuf,
    pub commit_timeout_ms: u64,
    pub channel_capacity: usize,
    pub busy_policy: BusyPolicy,
    pub notification_ttl_ms: u64,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// Raw `LIST_SYNC_BUSY_POLICY`, re-checked by `validate`
    busy_policy_raw: Option<String>,
}

impl SyncConfig {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::defaults();
        let busy_policy_raw = std::env::var("LIST_SYNC_BUSY_POLICY").ok();
        Self {
            db_path: std::env::var("LIST_SYNC_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            commit_timeout_ms: std::env::var("LIST_SYNC_COMMIT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.commit_timeout_ms),
            channel_capacity: std::env::var("LIST_SYNC_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.channel_capacity),
            busy_policy: busy_policy_raw
                .as_deref()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.busy_policy),
            busy_policy_raw,
            notification_ttl_ms: std::env::var("LIST_SYNC_NOTIFICATION_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.notification_ttl_ms),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    fn defaults() -> Self {
        Self {
            db_path: PathBuf::from("./data/list-sync.redb"),
            commit_timeout_ms: 10_000,
            channel_capacity: 256,
            busy_policy: BusyPolicy::Queue,
            notification_ttl_ms: 5_000,
            log_level: "info".to_string(),
            log_dir: None,
            busy_policy_raw: None,
        }
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_commit_timeout_ms(mut self, ms: u64) -> Self {
        self.commit_timeout_ms = ms;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_busy_policy(mut self, policy: BusyPolicy) -> Self {
        self.busy_policy = policy;
        self.busy_policy_raw = None;
        self
    }

    pub fn with_notification_ttl_ms(mut self, ms: u64) -> Self {
        self.notification_ttl_ms = ms;
        self
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.commit_timeout_ms == 0 {
            return Err(SyncError::Config("commit timeout must be > 0".into()));
        }
        if self.channel_capacity == 0 {
            return Err(SyncError::Config("channel capacity must be > 0".into()));
        }
        if let Some(raw) = &self.busy_policy_raw {
            raw.parse::<BusyPolicy>()?;
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
