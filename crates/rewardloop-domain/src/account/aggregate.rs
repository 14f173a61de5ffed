use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::value_objects::{AccountStatus, LogLevel, LogRing, TaskStats};
use crate::gateway::{DashboardSnapshot, TokenGrant};
use crate::history::{PointHistory, RecordOutcome};
use crate::schedule;
use crate::shared::{AccountId, DomainError, RunId};

/// One credentialed identity being automated.
///
/// The aggregate owns the run state machine: `Idle -> Running -> {Success,
/// Error, Risk}`, with `Success`/`Error` optionally returning to `Idle` via
/// the run-id-keyed idle reset. `Risk` is sticky until the next explicit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    name: String,
    refresh_token: String,
    access_token: Option<String>,
    token_expires_at: Option<DateTime<Utc>>,
    status: AccountStatus,
    logs: LogRing,
    total_points: i64,
    stats: TaskStats,
    point_history: PointHistory,
    enabled: bool,
    cron_enabled: bool,
    cron_expression: Option<String>,
    ignore_risk: bool,
    last_run_at: Option<DateTime<Utc>>,
    last_daily_success: Option<DateTime<Utc>>,
    last_run_id: Option<RunId>,
    created_at: DateTime<Utc>,
}

/// Raw field bundle used to rebuild an account from persistence.
#[derive(Debug, Clone)]
pub struct AccountParts {
    pub id: AccountId,
    pub name: String,
    pub refresh_token: String,
    pub access_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub status: AccountStatus,
    pub logs: LogRing,
    pub total_points: i64,
    pub stats: TaskStats,
    pub point_history: PointHistory,
    pub enabled: bool,
    pub cron_enabled: bool,
    pub cron_expression: Option<String>,
    pub ignore_risk: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_daily_success: Option<DateTime<Utc>>,
    pub last_run_id: Option<RunId>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(name: String, refresh_token: String) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Account name cannot be empty".to_string(),
            ));
        }
        if refresh_token.trim().is_empty() {
            return Err(DomainError::InvalidCredentials(
                "Refresh token is required".to_string(),
            ));
        }

        Ok(Self {
            id: AccountId::new(),
            name: name.trim().to_string(),
            refresh_token: refresh_token.trim().to_string(),
            access_token: None,
            token_expires_at: None,
            status: AccountStatus::Idle,
            logs: LogRing::new(),
            total_points: 0,
            stats: TaskStats::default(),
            point_history: PointHistory::new(),
            enabled: true,
            cron_enabled: false,
            cron_expression: None,
            ignore_risk: false,
            last_run_at: None,
            last_daily_success: None,
            last_run_id: None,
            created_at: Utc::now(),
        })
    }

    pub fn restore(parts: AccountParts) -> Self {
        Self {
            id: parts.id,
            name: parts.name,
            refresh_token: parts.refresh_token,
            access_token: parts.access_token,
            token_expires_at: parts.token_expires_at,
            status: parts.status,
            logs: parts.logs,
            total_points: parts.total_points,
            stats: parts.stats,
            point_history: parts.point_history,
            enabled: parts.enabled,
            cron_enabled: parts.cron_enabled,
            cron_expression: parts.cron_expression,
            ignore_risk: parts.ignore_risk,
            last_run_at: parts.last_run_at,
            last_daily_success: parts.last_daily_success,
            last_run_id: parts.last_run_id,
            created_at: parts.created_at,
        }
    }

    // Getters

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.token_expires_at
    }

    pub fn status(&self) -> AccountStatus {
        self.status
    }

    pub fn logs(&self) -> &LogRing {
        &self.logs
    }

    pub fn total_points(&self) -> i64 {
        self.total_points
    }

    pub fn stats(&self) -> &TaskStats {
        &self.stats
    }

    pub fn point_history(&self) -> &PointHistory {
        &self.point_history
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn cron_enabled(&self) -> bool {
        self.cron_enabled
    }

    pub fn cron_expression(&self) -> Option<&str> {
        self.cron_expression.as_deref()
    }

    pub fn ignore_risk(&self) -> bool {
        self.ignore_risk
    }

    pub fn last_run_at(&self) -> Option<DateTime<Utc>> {
        self.last_run_at
    }

    pub fn last_daily_success(&self) -> Option<DateTime<Utc>> {
        self.last_daily_success
    }

    pub fn last_run_id(&self) -> Option<&RunId> {
        self.last_run_id.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Completed a successful run on the given calendar day (UTC)?
    pub fn succeeded_on(&self, day: chrono::NaiveDate) -> bool {
        self.last_daily_success
            .map(|at| at.date_naive() == day)
            .unwrap_or(false)
    }

    // Mutators

    pub fn update_name(&mut self, name: String) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Account name cannot be empty".to_string(),
            ));
        }
        self.name = name.trim().to_string();
        Ok(())
    }

    pub fn set_refresh_token(&mut self, refresh_token: String) -> Result<(), DomainError> {
        if refresh_token.trim().is_empty() {
            return Err(DomainError::InvalidCredentials(
                "Refresh token is required".to_string(),
            ));
        }
        self.refresh_token = refresh_token.trim().to_string();
        // A new long-lived secret invalidates whatever access token we held.
        self.access_token = None;
        self.token_expires_at = None;
        Ok(())
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_cron_enabled(&mut self, enabled: bool) {
        self.cron_enabled = enabled;
    }

    pub fn set_cron_expression(
        &mut self,
        expression: Option<String>,
    ) -> Result<(), DomainError> {
        if let Some(expr) = expression.as_deref() {
            schedule::validate_expression(expr)?;
        }
        self.cron_expression = expression;
        Ok(())
    }

    pub fn set_ignore_risk(&mut self, ignore_risk: bool) {
        self.ignore_risk = ignore_risk;
    }

    // Token lifecycle

    /// Token usable without a refresh: present and not within `threshold` of
    /// its expiry.
    pub fn token_valid(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match (&self.access_token, self.token_expires_at) {
            (Some(_), Some(expires_at)) => expires_at > now + threshold,
            _ => false,
        }
    }

    /// Apply a refresh/exchange result: rotates the long-lived secret and
    /// replaces the access token.
    pub fn apply_token_grant(&mut self, grant: &TokenGrant, now: DateTime<Utc>) {
        self.refresh_token = grant.refresh_token.clone();
        self.access_token = Some(grant.access_token.clone());
        self.token_expires_at = Some(now + Duration::seconds(grant.expires_in));
    }

    // Run state machine

    /// Start a run. Rejected while a run is already in flight; the caller
    /// must not queue behind it.
    pub fn begin_run(&mut self, now: DateTime<Utc>) -> Result<RunId, DomainError> {
        if self.status == AccountStatus::Running {
            return Err(DomainError::AlreadyRunning(self.id.to_string()));
        }
        let run_id = RunId::new();
        self.status = AccountStatus::Running;
        self.last_run_at = Some(now);
        self.last_run_id = Some(run_id.clone());
        Ok(run_id)
    }

    /// Mark an account queued behind a batch delay.
    pub fn mark_waiting(&mut self) {
        if self.status != AccountStatus::Running {
            self.status = AccountStatus::Waiting;
        }
    }

    /// Manual schedule reset: zero the last-run stamp so the account's cron
    /// entry may fire again on the very next heartbeat.
    pub fn clear_last_run_stamp(&mut self) {
        self.last_run_at = None;
    }

    /// Finish the run identified by `run_id` with a terminal status. A stale
    /// run id (a newer run already started) is ignored.
    pub fn finish_run(
        &mut self,
        run_id: &RunId,
        status: AccountStatus,
        now: DateTime<Utc>,
    ) -> bool {
        if !status.is_terminal() || self.last_run_id.as_ref() != Some(run_id) {
            return false;
        }
        self.status = status;
        if status == AccountStatus::Success {
            self.last_daily_success = Some(now);
        }
        true
    }

    /// Recover from a process crash that left the account mid-run: a
    /// persisted `Running`/`Waiting` status with no live run behind it would
    /// otherwise gate the account out of every future run.
    pub fn recover_interrupted(&mut self, now: DateTime<Utc>) -> bool {
        if matches!(self.status, AccountStatus::Running | AccountStatus::Waiting) {
            self.status = AccountStatus::Idle;
            self.push_log(LogLevel::Warn, "Interrupted run recovered at startup", now);
            return true;
        }
        false
    }

    /// Idle-reset: return to `Idle` only if the given run is still the latest
    /// and ended in `Success` or `Error`. `Risk` stays sticky.
    pub fn reset_to_idle_if(&mut self, run_id: &RunId) -> bool {
        if self.last_run_id.as_ref() != Some(run_id) {
            return false;
        }
        if matches!(self.status, AccountStatus::Success | AccountStatus::Error) {
            self.status = AccountStatus::Idle;
            return true;
        }
        false
    }

    // Run bookkeeping

    pub fn push_log(&mut self, level: LogLevel, message: impl Into<String>, at: DateTime<Utc>) {
        self.logs.push(level, message, at);
    }

    /// Record a point reading into the bounded history and update the cached
    /// total.
    pub fn record_points(&mut self, points: i64, now: DateTime<Utc>) -> RecordOutcome {
        self.total_points = points;
        self.point_history.record(points, now)
    }

    /// Fold a dashboard snapshot into the cached totals and task stats.
    pub fn apply_dashboard(&mut self, snapshot: &DashboardSnapshot) {
        self.total_points = snapshot.total_points;
        self.stats.sign_done = snapshot.check_in_done;
        self.stats.read_progress = snapshot.read.progress;
        self.stats.read_max = snapshot.read.max;
        self.stats.daily_progress = snapshot.daily_set.progress;
        self.stats.daily_max = snapshot.daily_set.max;
    }

    /// Optimistic local increment while the read loop is in flight.
    pub fn bump_read_progress(&mut self) {
        self.stats.read_progress = self.stats.read_progress.saturating_add(1);
    }
}
