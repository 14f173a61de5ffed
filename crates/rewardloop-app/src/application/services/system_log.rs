use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use rewardloop_domain::account::LogLevel;

/// Where a system log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    Scheduler,
    Runner,
    Backup,
    Sync,
    Manual,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::Scheduler => "scheduler",
            LogSource::Runner => "runner",
            LogSource::Backup => "backup",
            LogSource::Sync => "sync",
            LogSource::Manual => "manual",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemLogEntry {
    pub at: DateTime<Utc>,
    pub source: LogSource,
    pub level: LogLevel,
    pub message: String,
}

/// Process-wide bounded log. Every status transition lands here as well as
/// in the account's own ring.
pub struct SystemLog {
    entries: Mutex<VecDeque<SystemLogEntry>>,
}

impl Default for SystemLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemLog {
    pub const CAPACITY: usize = 200;

    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, source: LogSource, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info => log::info!("[{}] {}", source, message),
            LogLevel::Warn => log::warn!("[{}] {}", source, message),
            LogLevel::Error => log::error!("[{}] {}", source, message),
        }

        let Ok(mut entries) = self.entries.lock() else {
            return;
        };
        entries.push_back(SystemLogEntry {
            at: Utc::now(),
            source,
            level,
            message,
        });
        while entries.len() > Self::CAPACITY {
            entries.pop_front();
        }
    }

    pub fn entries(&self) -> Vec<SystemLogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }
}
