use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::shared::DomainError;

/// Account lifecycle status.
///
/// `Running` acts as the mutual-exclusion gate: no second run may start for
/// the same account until it transitions out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Idle,
    Running,
    Success,
    Error,
    Risk,
    Waiting,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Idle => "idle",
            AccountStatus::Running => "running",
            AccountStatus::Success => "success",
            AccountStatus::Error => "error",
            AccountStatus::Risk => "risk",
            AccountStatus::Waiting => "waiting",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AccountStatus::Success | AccountStatus::Error | AccountStatus::Risk
        )
    }

    /// Glyph used in notification reports and logs.
    pub fn glyph(&self) -> &'static str {
        match self {
            AccountStatus::Idle => "⏸️",
            AccountStatus::Running => "🔄",
            AccountStatus::Success => "✅",
            AccountStatus::Error => "❌",
            AccountStatus::Risk => "⚠️",
            AccountStatus::Waiting => "⏳",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(AccountStatus::Idle),
            "running" => Ok(AccountStatus::Running),
            "success" => Ok(AccountStatus::Success),
            "error" => Ok(AccountStatus::Error),
            "risk" => Ok(AccountStatus::Risk),
            "waiting" => Ok(AccountStatus::Waiting),
            _ => Err(DomainError::InvalidInput(format!(
                "Unknown account status: {s}"
            ))),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Bounded per-account log: oldest entries fall off once full.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRing {
    entries: VecDeque<LogEntry>,
}

impl LogRing {
    pub const CAPACITY: usize = 50;

    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn restore(entries: Vec<LogEntry>) -> Self {
        let mut ring = Self {
            entries: entries.into(),
        };
        while ring.entries.len() > Self::CAPACITY {
            ring.entries.pop_front();
        }
        ring
    }

    pub fn push(&mut self, level: LogLevel, message: impl Into<String>, at: DateTime<Utc>) {
        self.entries.push_back(LogEntry {
            at,
            level,
            message: message.into(),
        });
        while self.entries.len() > Self::CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-task progress snapshot kept on the account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskStats {
    /// Daily check-in already claimed today.
    pub sign_done: bool,
    /// Read-task progress against its reported maximum.
    pub read_progress: u32,
    pub read_max: u32,
    /// Daily-set progress shown on reports.
    pub daily_progress: u32,
    pub daily_max: u32,
}

impl TaskStats {
    pub fn read_complete(&self) -> bool {
        self.read_max > 0 && self.read_progress >= self.read_max
    }

    pub fn read_remaining(&self) -> u32 {
        self.read_max.saturating_sub(self.read_progress)
    }
}
