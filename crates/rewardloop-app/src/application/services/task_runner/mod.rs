mod read;
mod sign;
mod types;

pub use types::{
    BatchOutcome, ReadOutcome, RunMode, RunOutcome, SignOutcome, SubCallOutcome, SubCallStatus,
    READ_LOOP_CAP,
};

use chrono::Utc;
use log::info;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

use rewardloop_domain::account::{Account, AccountStatus, LogLevel};
use rewardloop_domain::gateway::{ApiError, RewardsGateway};
use rewardloop_domain::shared::{AccountId, DomainError, RunId};

use super::credential_service::CredentialService;
use super::system_log::{LogSource, SystemLog};
use crate::application::config::{AppConfig, ConfigService};
use types::StepsOutcome;

/// Per-account task orchestrator: the sequential run pipeline, risk
/// handling, history recording, and batch processing.
pub struct TaskRunner {
    gateway: Arc<dyn RewardsGateway>,
    account_repo: Arc<dyn rewardloop_domain::account::AccountRepository>,
    credentials: Arc<CredentialService>,
    config: Arc<ConfigService>,
    system_log: Arc<SystemLog>,
    /// In-flight account ids; backs the `Running` status gate.
    running: Mutex<HashSet<String>>,
    batch_running: AtomicBool,
    stop_requested: AtomicBool,
}

impl TaskRunner {
    pub fn new(
        gateway: Arc<dyn RewardsGateway>,
        account_repo: Arc<dyn rewardloop_domain::account::AccountRepository>,
        credentials: Arc<CredentialService>,
        config: Arc<ConfigService>,
        system_log: Arc<SystemLog>,
    ) -> Arc<Self> {
        Arc::new(Self {
            gateway,
            account_repo,
            credentials,
            config,
            system_log,
            running: Mutex::new(HashSet::new()),
            batch_running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
        })
    }

    /// Cooperative cancellation: polled between accounts in batch mode, never
    /// mid-account.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Run the full task sequence for one account.
    ///
    /// A second start while the account is running is rejected without
    /// altering state; callers must not queue behind it.
    #[instrument(skip(self), fields(account_id = %account_id, mode = %mode))]
    pub async fn run(
        &self,
        account_id: &AccountId,
        mode: RunMode,
        source: LogSource,
    ) -> Result<RunOutcome, DomainError> {
        self.claim(account_id).await?;
        let result = self.run_claimed(account_id, mode, source).await;
        self.release(account_id).await;
        result
    }

    async fn claim(&self, account_id: &AccountId) -> Result<(), DomainError> {
        let mut running = self.running.lock().await;
        if !running.insert(account_id.as_str().to_string()) {
            return Err(DomainError::AlreadyRunning(account_id.to_string()));
        }
        Ok(())
    }

    async fn release(&self, account_id: &AccountId) {
        self.running.lock().await.remove(account_id.as_str());
    }

    async fn run_claimed(
        &self,
        account_id: &AccountId,
        mode: RunMode,
        source: LogSource,
    ) -> Result<RunOutcome, DomainError> {
        let now = Utc::now();
        let mut account = self
            .account_repo
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;

        // Step 1: transition to running, stamp lastRunTime.
        let run_id = account.begin_run(now)?;
        account.push_log(LogLevel::Info, format!("Run started ({mode})"), now);
        self.account_repo.save(&account).await?;
        self.system_log.record(
            source,
            LogLevel::Info,
            format!("Run started for {} ({})", account.name(), mode),
        );

        let config = self.config.get().await;
        let steps = self.execute_steps(&mut account, mode, &config).await;

        let finished_at = Utc::now();
        let (status, outcome_parts, message) = match steps {
            Ok(parts) => {
                let message = format!("earned {} points", parts.earned);
                account.push_log(
                    LogLevel::Info,
                    format!("Run finished: +{} points", parts.earned),
                    finished_at,
                );
                (AccountStatus::Success, parts, message)
            }
            Err(e) => {
                let status = status_for_error(&e);
                let message = e.to_string();
                account.push_log(
                    if status == AccountStatus::Risk {
                        LogLevel::Error
                    } else {
                        LogLevel::Warn
                    },
                    format!("Run failed ({}): {message}", status.as_str()),
                    finished_at,
                );
                self.system_log.record(
                    source,
                    LogLevel::Error,
                    format!("Run failed for {} ({}): {message}", account.name(), status),
                );
                (
                    status,
                    StepsOutcome {
                        earned: 0,
                        sign: None,
                        read: None,
                    },
                    message,
                )
            }
        };

        account.finish_run(&run_id, status, finished_at);
        self.account_repo.save(&account).await?;

        if status == AccountStatus::Success {
            self.system_log.record(
                source,
                LogLevel::Info,
                format!(
                    "Run finished for {}: +{} points ({} total)",
                    account.name(),
                    outcome_parts.earned,
                    account.total_points()
                ),
            );
        }

        self.arm_idle_reset(account_id.clone(), run_id.clone(), config.idle_reset_minutes);

        Ok(RunOutcome {
            account_id: account_id.clone(),
            account_name: account.name().to_string(),
            run_id,
            mode,
            status,
            earned: outcome_parts.earned,
            total_points: account.total_points(),
            sign: outcome_parts.sign,
            read: outcome_parts.read,
            message,
        })
    }

    /// Steps 2-6 of the run pipeline, strictly sequential.
    async fn execute_steps(
        &self,
        account: &mut Account,
        mode: RunMode,
        config: &AppConfig,
    ) -> Result<StepsOutcome, DomainError> {
        // Step 2: resolve a valid access token.
        let token = self.credentials.ensure_valid_token(account).await?;

        // Step 3: baseline dashboard snapshot, recorded to history.
        let baseline_points = match self.gateway.fetch_dashboard(&token).await {
            Ok(snapshot) => {
                account.apply_dashboard(&snapshot);
                account.record_points(snapshot.total_points, Utc::now());
                snapshot.total_points
            }
            Err(e) => {
                self.tolerate_risk(account, e, "baseline dashboard")?;
                account.total_points()
            }
        };

        // Step 4: sign sequence.
        let sign = if mode.includes_sign() {
            let outcome = self.run_sign_sequence(account, &token).await?;
            self.human_delay(config).await;
            Some(outcome)
        } else {
            None
        };

        // Step 5: read loop while progress trails the reported maximum.
        let read = if mode.includes_read() && !account.stats().read_complete() {
            Some(self.run_read_loop(account, &token, config).await?)
        } else {
            None
        };

        // Step 6: final snapshot; earned is the dashboard delta, not the sum
        // of per-call claims.
        let now = Utc::now();
        let total_points = match self.gateway.fetch_dashboard(&token).await {
            Ok(snapshot) => {
                account.apply_dashboard(&snapshot);
                account.record_points(snapshot.total_points, now);
                snapshot.total_points
            }
            Err(e) => {
                self.tolerate_risk(account, e, "final dashboard")?;
                account.total_points()
            }
        };

        Ok(StepsOutcome {
            earned: total_points - baseline_points,
            sign,
            read,
        })
    }

    /// Apply the risk policy to a failed remote call. Returns `Ok` when the
    /// signal is soft and the account ignores risk (the run continues);
    /// everything else surfaces upward.
    pub(super) fn tolerate_risk(
        &self,
        account: &mut Account,
        error: ApiError,
        context: &str,
    ) -> Result<(), DomainError> {
        match error.risk_kind() {
            Some(kind) if account.ignore_risk() && !kind.is_fatal() => {
                account.push_log(
                    LogLevel::Warn,
                    format!("Soft risk signal ignored during {context}: {error}"),
                    Utc::now(),
                );
                log::warn!(
                    "[{}] Ignoring soft risk signal during {}: {}",
                    account.name(),
                    context,
                    error
                );
                Ok(())
            }
            _ => Err(to_domain_error(error)),
        }
    }

    /// Randomized human-like pause, uniform whole seconds between the
    /// configured bounds.
    pub(super) async fn human_delay(&self, config: &AppConfig) {
        let (min, max) = config.delay_bounds();
        if max == 0 {
            return;
        }
        let secs = {
            use rand::Rng;
            rand::thread_rng().gen_range(min..=max)
        };
        tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
    }

    /// Step 7: one-shot idle-reset timer keyed by run id. A newer run
    /// invalidates the stale reset rather than racing it.
    fn arm_idle_reset(&self, account_id: AccountId, run_id: RunId, idle_reset_minutes: u64) {
        if idle_reset_minutes == 0 {
            return;
        }
        let repo = self.account_repo.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(idle_reset_minutes * 60)).await;
            match repo.find_by_id(&account_id).await {
                Ok(Some(mut account)) => {
                    if account.reset_to_idle_if(&run_id) {
                        if let Err(e) = repo.save(&account).await {
                            log::error!("Idle reset save failed for {}: {}", account_id, e);
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => log::error!("Idle reset load failed for {}: {}", account_id, e),
            }
        });
    }

    /// Balance-only refresh: fetch a dashboard snapshot and record it to
    /// history without running any task. Holds the same per-account gate as
    /// a full run so it cannot interleave with one.
    pub async fn refresh_dashboard(&self, account_id: &AccountId) -> Result<i64, DomainError> {
        self.claim(account_id).await?;
        let result = self.refresh_dashboard_claimed(account_id).await;
        self.release(account_id).await;
        result
    }

    async fn refresh_dashboard_claimed(&self, account_id: &AccountId) -> Result<i64, DomainError> {
        let mut account = self
            .account_repo
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(account_id.to_string()))?;
        if account.status() == AccountStatus::Running {
            return Err(DomainError::AlreadyRunning(account_id.to_string()));
        }

        let token = self.credentials.ensure_valid_token(&mut account).await?;
        let snapshot = self
            .gateway
            .fetch_dashboard(&token)
            .await
            .map_err(to_domain_error)?;
        account.apply_dashboard(&snapshot);
        account.record_points(snapshot.total_points, Utc::now());
        self.account_repo.save(&account).await?;

        info!(
            "[{}] Dashboard refreshed: {} points",
            account.name(),
            snapshot.total_points
        );
        Ok(snapshot.total_points)
    }

    /// Batch run over all enabled accounts: strictly sequential, with the
    /// configured inter-account delay and a stop flag polled at account
    /// boundaries only. One account's failure never aborts the batch.
    pub async fn run_batch(&self, mode: RunMode, source: LogSource) -> Result<BatchOutcome, DomainError> {
        if self.batch_running.swap(true, Ordering::SeqCst) {
            return Err(DomainError::AlreadyRunning("batch".to_string()));
        }
        self.stop_requested.store(false, Ordering::SeqCst);

        let result = self.run_batch_inner(mode, source).await;
        self.batch_running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_batch_inner(
        &self,
        mode: RunMode,
        source: LogSource,
    ) -> Result<BatchOutcome, DomainError> {
        let config = self.config.get().await;
        let accounts = self.account_repo.find_enabled().await?;
        let today = Utc::now().date_naive();

        let mut selected: Vec<Account> = Vec::new();
        let mut skipped_count = 0usize;
        for account in accounts {
            if account.status() == AccountStatus::Running {
                skipped_count += 1;
                continue;
            }
            if config.skip_completed && source == LogSource::Scheduler && account.succeeded_on(today)
            {
                info!("[{}] Skipped: already succeeded today", account.name());
                skipped_count += 1;
                continue;
            }
            selected.push(account);
        }

        self.system_log.record(
            source,
            LogLevel::Info,
            format!(
                "Batch run started: {} accounts ({} skipped)",
                selected.len(),
                skipped_count
            ),
        );

        // Queue the rest behind the inter-account delay.
        for account in selected.iter().skip(1) {
            let mut waiting = account.clone();
            waiting.mark_waiting();
            self.account_repo.save(&waiting).await?;
        }

        let mut results = Vec::new();
        let mut success_count = 0usize;
        let mut failed_count = 0usize;
        let mut stopped_early = false;

        for (index, account) in selected.iter().enumerate() {
            if self.stop_requested.load(Ordering::SeqCst) {
                self.system_log.record(
                    source,
                    LogLevel::Warn,
                    format!("Batch run stopped before {}", account.name()),
                );
                stopped_early = true;
                break;
            }

            if index > 0 && config.batch_account_delay_secs > 0 {
                tokio::time::sleep(std::time::Duration::from_secs(
                    config.batch_account_delay_secs,
                ))
                .await;
            }

            match self.run(account.id(), mode, source).await {
                Ok(outcome) => {
                    if outcome.status == AccountStatus::Success {
                        success_count += 1;
                    } else {
                        failed_count += 1;
                    }
                    results.push(outcome);
                }
                Err(e) => {
                    failed_count += 1;
                    log::error!("Batch run failed for {}: {}", account.name(), e);
                }
            }
        }

        self.system_log.record(
            source,
            LogLevel::Info,
            format!(
                "Batch run finished: {} succeeded, {} failed, {} skipped",
                success_count, failed_count, skipped_count
            ),
        );

        Ok(BatchOutcome {
            total: selected.len(),
            success_count,
            failed_count,
            skipped_count,
            stopped_early,
            results,
        })
    }
}

/// Map a failed step to the terminal account status. Messages that mention
/// suspension or risk mark the account `Risk`; anything else is a plain
/// `Error`.
fn status_for_error(error: &DomainError) -> AccountStatus {
    if matches!(error, DomainError::RiskDetected(_)) {
        return AccountStatus::Risk;
    }
    let message = error.to_string().to_lowercase();
    if message.contains("suspend") || message.contains("risk") {
        AccountStatus::Risk
    } else {
        AccountStatus::Error
    }
}

pub(super) fn to_domain_error(error: ApiError) -> DomainError {
    if error.is_risk() {
        DomainError::RiskDetected(error.to_string())
    } else {
        DomainError::TaskFailed(error.to_string())
    }
}
