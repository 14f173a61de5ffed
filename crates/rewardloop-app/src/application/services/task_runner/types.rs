use serde::{Deserialize, Serialize};
use std::fmt;

use rewardloop_domain::account::AccountStatus;
use rewardloop_domain::gateway::ActivityKind;
use rewardloop_domain::shared::{AccountId, RunId};

/// Safety cap for the read loop, regardless of the remaining progress gap
/// the dashboard reports.
pub const READ_LOOP_CAP: u32 = 35;

/// Fixed pause between the three sign sub-calls.
pub(super) const SIGN_STEP_PAUSE_SECS: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    All,
    SignOnly,
    ReadOnly,
}

impl RunMode {
    pub fn includes_sign(&self) -> bool {
        matches!(self, RunMode::All | RunMode::SignOnly)
    }

    pub fn includes_read(&self) -> bool {
        matches!(self, RunMode::All | RunMode::ReadOnly)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::All => "all",
            RunMode::SignOnly => "sign_only",
            RunMode::ReadOnly => "read_only",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How one sign sub-call ended. "Already claimed" is expected steady-state
/// behavior and kept distinct from genuine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubCallStatus {
    Succeeded,
    AlreadyClaimed,
    /// Soft risk signal tolerated because the account ignores risk.
    SoftRisk,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCallOutcome {
    pub kind: ActivityKind,
    pub status: SubCallStatus,
    pub points: i64,
    pub note: Option<String>,
}

/// The three quasi-independent sign sub-calls, kept separately so reports
/// can tell "already claimed" from real failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignOutcome {
    pub heartbeat: SubCallOutcome,
    pub bonus: SubCallOutcome,
    pub check_in: SubCallOutcome,
}

impl SignOutcome {
    fn calls(&self) -> [&SubCallOutcome; 3] {
        [&self.heartbeat, &self.bonus, &self.check_in]
    }

    /// The three calls probe different award rules; the aggregate counts as
    /// success when any of them landed.
    pub fn any_succeeded(&self) -> bool {
        self.calls()
            .iter()
            .any(|c| c.status == SubCallStatus::Succeeded)
    }

    pub fn points(&self) -> i64 {
        self.calls().iter().map(|c| c.points).sum()
    }

    pub fn summary(&self) -> String {
        self.calls()
            .iter()
            .map(|c| format!("{}: {:?}", c.kind.label(), c.status))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReadOutcome {
    pub iterations: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub account_id: AccountId,
    pub account_name: String,
    pub run_id: RunId,
    pub mode: RunMode,
    pub status: AccountStatus,
    pub earned: i64,
    pub total_points: i64,
    pub sign: Option<SignOutcome>,
    pub read: Option<ReadOutcome>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
    pub stopped_early: bool,
    pub results: Vec<RunOutcome>,
}

/// Intermediate result of the sequential run steps.
pub(super) struct StepsOutcome {
    pub earned: i64,
    pub sign: Option<SignOutcome>,
    pub read: Option<ReadOutcome>,
}
