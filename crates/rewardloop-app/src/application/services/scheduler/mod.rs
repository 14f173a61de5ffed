mod dispatch;
mod heartbeat;
mod types;

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use rewardloop_domain::account::{AccountRepository, LogLevel};
use rewardloop_domain::shared::{AccountId, DomainError};

use super::backup_service::BackupService;
use super::notification_router::NotificationRouter;
use super::system_log::{LogSource, SystemLog};
use super::task_runner::TaskRunner;
use crate::application::config::ConfigService;

/// Dual-level scheduler: one heartbeat evaluates the global task cadence,
/// every per-account cron entry, the local-backup entry, and each cloud-sync
/// entry. The scheduler owns evaluation; entry owners persist the last-run
/// stamps.
pub struct Scheduler {
    config: Arc<ConfigService>,
    account_repo: Arc<dyn AccountRepository>,
    runner: Arc<TaskRunner>,
    router: Arc<NotificationRouter>,
    backup: Arc<BackupService>,
    system_log: Arc<SystemLog>,
    heartbeat_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(
        config: Arc<ConfigService>,
        account_repo: Arc<dyn AccountRepository>,
        runner: Arc<TaskRunner>,
        router: Arc<NotificationRouter>,
        backup: Arc<BackupService>,
        system_log: Arc<SystemLog>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            account_repo,
            runner,
            router,
            backup,
            system_log,
            heartbeat_handle: Mutex::new(None),
        })
    }

    /// Recover accounts a previous process left mid-run, then start the
    /// heartbeat loop.
    pub async fn start(self: &Arc<Self>) {
        if let Err(e) = self.recover_interrupted_accounts().await {
            self.system_log.record(
                LogSource::Scheduler,
                LogLevel::Error,
                format!("Startup recovery failed: {e}"),
            );
        }

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            scheduler.run_loop().await;
        });
        *self.heartbeat_handle.lock().await = Some(handle);
        info!("✅ Scheduler started (heartbeat every {}s)", types::HEARTBEAT_SECS);
    }

    /// Stop the heartbeat and ask any in-flight batch to wind down at the
    /// next account boundary.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.heartbeat_handle.lock().await.take() {
            handle.abort();
        }
        self.runner.request_stop();
        info!("🛑 Scheduler stopped");
    }

    /// A crashed process can leave accounts stuck in `running`/`waiting`,
    /// which would gate them out of every future run.
    pub async fn recover_interrupted_accounts(&self) -> Result<usize, DomainError> {
        let accounts = self.account_repo.find_all().await?;
        let now = Utc::now();
        let mut recovered = 0usize;
        for mut account in accounts {
            if account.recover_interrupted(now) {
                self.account_repo.save(&account).await?;
                recovered += 1;
            }
        }
        if recovered > 0 {
            self.system_log.record(
                LogSource::Scheduler,
                LogLevel::Warn,
                format!("Recovered {recovered} interrupted account(s) at startup"),
            );
        }
        Ok(recovered)
    }

    // Manual reset escape hatches: a zeroed stamp may re-fire on the very
    // next heartbeat if the current minute still matches.

    pub async fn reset_task_schedule(&self) {
        self.config
            .update(|c| c.task_schedule.reset_last_run())
            .await;
        self.system_log.record(
            LogSource::Manual,
            LogLevel::Info,
            "Global task schedule reset",
        );
    }

    pub async fn reset_backup_schedule(&self) {
        self.config
            .update(|c| c.backup_schedule.reset_last_run())
            .await;
        self.system_log.record(
            LogSource::Manual,
            LogLevel::Info,
            "Backup schedule reset",
        );
    }

    pub async fn reset_sync_schedule(&self, name: &str) {
        let name = name.to_string();
        self.config
            .update(|c| {
                if let Some(remote) = c.sync_remotes.iter_mut().find(|r| r.name == name) {
                    remote.schedule.reset_last_run();
                }
            })
            .await;
        self.system_log.record(
            LogSource::Manual,
            LogLevel::Info,
            format!("Sync schedule reset: {name}"),
        );
    }

    pub async fn reset_account_schedule(&self, account_id: &AccountId) -> Result<(), DomainError> {
        let mut account = self
            .account_repo
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;
        account.clear_last_run_stamp();
        self.account_repo.save(&account).await?;
        self.system_log.record(
            LogSource::Manual,
            LogLevel::Info,
            format!("Account schedule reset: {}", account.name()),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{
        fast_config, FakeGateway, InMemoryAccountRepository, InMemoryTargetRepository,
    };
    use crate::application::services::CredentialService;
    use chrono::{DateTime, NaiveDateTime};
    use rewardloop_domain::account::Account;
    use rewardloop_domain::gateway::RewardsGateway;
    use rewardloop_domain::schedule::ScheduleEntry;

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn scheduler_context() -> (Arc<Scheduler>, Arc<InMemoryAccountRepository>, Arc<ConfigService>) {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let gateway: Arc<dyn RewardsGateway> = Arc::new(FakeGateway::new());
        let credentials = Arc::new(CredentialService::new(gateway.clone()));
        let config = Arc::new(ConfigService::new(fast_config()));
        let system_log = Arc::new(SystemLog::new());
        let runner = TaskRunner::new(
            gateway,
            repo.clone() as Arc<dyn AccountRepository>,
            credentials,
            config.clone(),
            system_log.clone(),
        );
        let router = Arc::new(NotificationRouter::new(
            Arc::new(InMemoryTargetRepository::new()),
            repo.clone() as Arc<dyn AccountRepository>,
            None,
            config.clone(),
            system_log.clone(),
        ));
        let backup = Arc::new(BackupService::new(
            repo.clone() as Arc<dyn AccountRepository>,
            config.clone(),
            system_log.clone(),
        ));
        let scheduler = Scheduler::new(
            config.clone(),
            repo.clone() as Arc<dyn AccountRepository>,
            runner,
            router,
            backup,
            system_log,
        );
        (scheduler, repo, config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_entry_fires_once_per_window() {
        let (scheduler, _repo, config) = scheduler_context();
        config
            .update(|c| {
                c.task_schedule = ScheduleEntry::restore("* * * * *".to_string(), true, None)
            })
            .await;

        let now = ts("2026-03-01 08:05:10");
        let summary = scheduler.tick(now).await;
        assert!(summary.batch_dispatched);
        assert_eq!(
            config.get().await.task_schedule.last_run_at(),
            Some(now)
        );

        // Same minute: no double fire.
        let summary = scheduler.tick(ts("2026-03-01 08:05:40")).await;
        assert!(!summary.batch_dispatched);

        // Next minute fires again.
        let summary = scheduler.tick(ts("2026-03-01 08:06:05")).await;
        assert!(summary.batch_dispatched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_refires_within_same_minute() {
        let (scheduler, _repo, config) = scheduler_context();
        config
            .update(|c| {
                c.task_schedule = ScheduleEntry::restore("* * * * *".to_string(), true, None)
            })
            .await;

        let now = ts("2026-03-01 08:05:10");
        assert!(scheduler.tick(now).await.batch_dispatched);
        assert!(!scheduler.tick(ts("2026-03-01 08:05:30")).await.batch_dispatched);

        scheduler.reset_task_schedule().await;
        assert!(scheduler.tick(ts("2026-03-01 08:05:50")).await.batch_dispatched);
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_entry_requires_both_toggles() {
        let (scheduler, repo, _config) = scheduler_context();

        let mut scheduled = Account::new(
            "Scheduled".to_string(),
            "M.R3_test_refresh_secret_long_enough_for_validation".to_string(),
        )
        .unwrap();
        scheduled.set_cron_enabled(true);
        scheduled
            .set_cron_expression(Some("* * * * *".to_string()))
            .unwrap();
        repo.save(&scheduled).await.unwrap();

        // Cron toggle off: the account keeps participating in batches but its
        // own schedule stays silent.
        let mut untoggled = Account::new(
            "Untoggled".to_string(),
            "M.R3_test_refresh_secret_long_enough_for_validation".to_string(),
        )
        .unwrap();
        untoggled
            .set_cron_expression(Some("* * * * *".to_string()))
            .unwrap();
        repo.save(&untoggled).await.unwrap();

        // Disabled account: its schedule is silent too.
        let mut disabled = Account::new(
            "Disabled".to_string(),
            "M.R3_test_refresh_secret_long_enough_for_validation".to_string(),
        )
        .unwrap();
        disabled.set_cron_enabled(true);
        disabled
            .set_cron_expression(Some("* * * * *".to_string()))
            .unwrap();
        disabled.set_enabled(false);
        repo.save(&disabled).await.unwrap();

        let summary = scheduler.tick(ts("2026-03-01 08:05:10")).await;
        assert_eq!(summary.account_runs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_cron_is_config_error_not_dispatch() {
        let (scheduler, repo, config) = scheduler_context();
        config
            .update(|c| {
                c.task_schedule =
                    ScheduleEntry::restore("not a cron".to_string(), true, None)
            })
            .await;

        let mut account = Account::new(
            "BadCron".to_string(),
            "M.R3_test_refresh_secret_long_enough_for_validation".to_string(),
        )
        .unwrap();
        account.set_cron_enabled(true);
        repo.save(&account).await.unwrap();

        let summary = scheduler.tick(ts("2026-03-01 08:05:10")).await;
        assert!(!summary.batch_dispatched);
        assert_eq!(summary.account_runs, 0);
        // Both the global entry and the account fallback hit the same broken
        // expression.
        assert_eq!(summary.config_errors, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backup_and_sync_entries_marked_fired() {
        let (scheduler, _repo, config) = scheduler_context();
        let dir = tempfile::tempdir().unwrap();
        config
            .update(|c| {
                c.snapshot_folder = dir.path().to_string_lossy().into_owned();
                c.backup_schedule = ScheduleEntry::restore("* * * * *".to_string(), true, None);
            })
            .await;

        let now = ts("2026-03-01 08:05:10");
        let summary = scheduler.tick(now).await;
        assert_eq!(summary.backups, 1);
        assert_eq!(config.get().await.backup_schedule.last_run_at(), Some(now));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recover_interrupted_accounts() {
        let (scheduler, repo, _config) = scheduler_context();

        let mut account = Account::new(
            "Stuck".to_string(),
            "M.R3_test_refresh_secret_long_enough_for_validation".to_string(),
        )
        .unwrap();
        let _ = account.begin_run(Utc::now()).unwrap();
        repo.save(&account).await.unwrap();

        let recovered = scheduler.recover_interrupted_accounts().await.unwrap();
        assert_eq!(recovered, 1);
        let saved = repo.find_by_id(account.id()).await.unwrap().unwrap();
        assert_eq!(
            saved.status(),
            rewardloop_domain::account::AccountStatus::Idle
        );
    }
}
