use std::sync::Arc;

use rewardloop_domain::account::LogLevel;
use rewardloop_domain::shared::{AccountId, DomainError};

use crate::application::config::SyncRemote;
use crate::application::services::system_log::LogSource;
use crate::application::services::task_runner::RunMode;

impl super::Scheduler {
    /// Full batch over enabled accounts. Spawned so the heartbeat keeps
    /// evaluating; the batch itself processes accounts strictly in sequence.
    pub(super) fn dispatch_batch(self: &Arc<Self>) {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            match scheduler
                .runner
                .run_batch(RunMode::All, LogSource::Scheduler)
                .await
            {
                Ok(batch) => {
                    scheduler.router.notify_batch(&batch).await;
                }
                Err(DomainError::AlreadyRunning(_)) => {
                    scheduler.system_log.record(
                        LogSource::Scheduler,
                        LogLevel::Warn,
                        "Batch dispatch skipped: previous batch still running",
                    );
                }
                Err(e) => {
                    scheduler.system_log.record(
                        LogSource::Scheduler,
                        LogLevel::Error,
                        format!("Batch run failed: {e}"),
                    );
                }
            }
        });
    }

    /// Single-account run from the account's own cron entry.
    pub(super) fn dispatch_account_run(self: &Arc<Self>, account_id: AccountId) {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            match scheduler
                .runner
                .run(&account_id, RunMode::All, LogSource::Scheduler)
                .await
            {
                Ok(outcome) => {
                    scheduler.router.notify_single(&outcome).await;
                }
                Err(DomainError::AlreadyRunning(_)) => {
                    scheduler.system_log.record(
                        LogSource::Scheduler,
                        LogLevel::Info,
                        format!("Scheduled run skipped, {account_id} already running"),
                    );
                }
                Err(e) => {
                    scheduler.system_log.record(
                        LogSource::Scheduler,
                        LogLevel::Error,
                        format!("Scheduled run failed for {account_id}: {e}"),
                    );
                }
            }
        });
    }

    pub(super) fn dispatch_backup(self: &Arc<Self>) {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = scheduler.backup.export_snapshot().await {
                scheduler.system_log.record(
                    LogSource::Backup,
                    LogLevel::Error,
                    format!("Scheduled backup failed: {e}"),
                );
            }
        });
    }

    pub(super) fn dispatch_sync(self: &Arc<Self>, remote: SyncRemote) {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = scheduler.backup.sync_with_remote(&remote).await {
                scheduler.system_log.record(
                    LogSource::Sync,
                    LogLevel::Error,
                    format!("Scheduled sync '{}' failed: {e}", remote.name),
                );
            }
        });
    }
}
