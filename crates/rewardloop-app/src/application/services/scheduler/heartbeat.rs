use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use rewardloop_domain::account::{AccountStatus, LogLevel};
use rewardloop_domain::schedule::ScheduleEntry;

use super::types::{TickSummary, HEARTBEAT_SECS};
use crate::application::services::system_log::LogSource;

impl super::Scheduler {
    pub(super) async fn run_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let summary = self.tick(Utc::now()).await;
            if summary.dispatched_anything() || summary.config_errors > 0 {
                debug!(
                    "💓 Heartbeat: batch={} accounts={} backups={} syncs={} config_errors={}",
                    summary.batch_dispatched,
                    summary.account_runs,
                    summary.backups,
                    summary.syncs,
                    summary.config_errors
                );
            }
        }
    }

    /// Evaluate every schedule entry against the current minute window and
    /// dispatch whatever is due, exactly once per window. Stamps advance
    /// before dispatch so a slow action cannot double-fire.
    pub(super) async fn tick(self: &Arc<Self>, now: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();
        let config = self.config.get().await;

        // Global task cadence: full batch over enabled accounts.
        match config.task_schedule.is_due(now) {
            Ok(true) => {
                self.config
                    .update(|c| c.task_schedule.mark_fired(now))
                    .await;
                self.dispatch_batch();
                summary.batch_dispatched = true;
            }
            Ok(false) => {}
            Err(e) => {
                summary.config_errors += 1;
                self.system_log.record(
                    LogSource::Scheduler,
                    LogLevel::Error,
                    format!("Global task schedule not evaluated: {e}"),
                );
            }
        }

        // Per-account cadences. The account's own expression falls back to
        // the global one; its own last-run stamp gates re-firing (the stamp
        // advances when the run starts).
        match self.account_repo.find_all().await {
            Ok(accounts) => {
                for account in accounts {
                    if !account.is_enabled() || !account.cron_enabled() {
                        continue;
                    }
                    let expression = account
                        .cron_expression()
                        .unwrap_or_else(|| config.task_schedule.expression());
                    let entry = ScheduleEntry::restore(
                        expression.to_string(),
                        true,
                        account.last_run_at(),
                    );
                    match entry.is_due(now) {
                        Ok(true) => {
                            if account.status() == AccountStatus::Running {
                                self.system_log.record(
                                    LogSource::Scheduler,
                                    LogLevel::Info,
                                    format!(
                                        "Skipped {}: previous run still in flight",
                                        account.name()
                                    ),
                                );
                                continue;
                            }
                            self.dispatch_account_run(account.id().clone());
                            summary.account_runs += 1;
                        }
                        Ok(false) => {}
                        Err(e) => {
                            summary.config_errors += 1;
                            self.system_log.record(
                                LogSource::Scheduler,
                                LogLevel::Error,
                                format!("Schedule for {} not evaluated: {e}", account.name()),
                            );
                        }
                    }
                }
            }
            Err(e) => {
                self.system_log.record(
                    LogSource::Scheduler,
                    LogLevel::Error,
                    format!("Account scan failed: {e}"),
                );
            }
        }

        // Local backup cadence.
        match config.backup_schedule.is_due(now) {
            Ok(true) => {
                self.config
                    .update(|c| c.backup_schedule.mark_fired(now))
                    .await;
                self.dispatch_backup();
                summary.backups += 1;
            }
            Ok(false) => {}
            Err(e) => {
                summary.config_errors += 1;
                self.system_log.record(
                    LogSource::Scheduler,
                    LogLevel::Error,
                    format!("Backup schedule not evaluated: {e}"),
                );
            }
        }

        // Cloud-sync cadences.
        for remote in &config.sync_remotes {
            match remote.schedule.is_due(now) {
                Ok(true) => {
                    let name = remote.name.clone();
                    self.config
                        .update(|c| {
                            if let Some(r) = c.sync_remotes.iter_mut().find(|r| r.name == name) {
                                r.schedule.mark_fired(now);
                            }
                        })
                        .await;
                    self.dispatch_sync(remote.clone());
                    summary.syncs += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    summary.config_errors += 1;
                    self.system_log.record(
                        LogSource::Scheduler,
                        LogLevel::Error,
                        format!("Sync schedule '{}' not evaluated: {e}", remote.name),
                    );
                }
            }
        }

        summary
    }
}
