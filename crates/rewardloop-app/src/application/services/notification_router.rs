use log::{debug, error, info};
use std::sync::Arc;

use rewardloop_domain::account::{Account, AccountRepository, LogLevel};
use rewardloop_domain::notification::{
    NotificationTarget, NotificationTargetRepository, PushMessage, PushSender,
};
use rewardloop_domain::shared::AccountId;

use super::system_log::{LogSource, SystemLog};
use super::task_runner::{BatchOutcome, RunOutcome};
use crate::application::config::ConfigService;
use crate::application::queries::history_queries::aggregate_by_day;

/// Fans run reports out to notification targets. Targets subscribe to
/// account sets (empty set = all); per-target delivery failures are logged
/// and never propagate into the run pipeline.
pub struct NotificationRouter {
    target_repo: Arc<dyn NotificationTargetRepository>,
    account_repo: Arc<dyn AccountRepository>,
    sender: Option<Arc<dyn PushSender>>,
    config: Arc<ConfigService>,
    system_log: Arc<SystemLog>,
}

impl NotificationRouter {
    pub fn new(
        target_repo: Arc<dyn NotificationTargetRepository>,
        account_repo: Arc<dyn AccountRepository>,
        sender: Option<Arc<dyn PushSender>>,
        config: Arc<ConfigService>,
        system_log: Arc<SystemLog>,
    ) -> Self {
        Self {
            target_repo,
            account_repo,
            sender,
            config,
            system_log,
        }
    }

    /// Report one completed single-account run, honoring the single-push
    /// policy flag.
    pub async fn notify_single(&self, outcome: &RunOutcome) {
        if !self.config.get().await.allow_single_push {
            debug!(
                "Single push disabled, not reporting run for {}",
                outcome.account_name
            );
            return;
        }

        let Some(report) = self.account_report(outcome).await else {
            return;
        };
        let message = PushMessage::markdown("RewardLoop · run report", report);
        self.fan_out(&[outcome.account_id.clone()], &message, |target, ids| {
            target.accepts(&ids[0])
        })
        .await;
    }

    /// Report a completed batch: one merged report per eligible target,
    /// filtered to the accounts that target subscribes to. The single-push
    /// policy flag does not apply here.
    pub async fn notify_batch(&self, batch: &BatchOutcome) {
        if batch.results.is_empty() {
            return;
        }

        let targets = match self.target_repo.find_all_enabled().await {
            Ok(targets) => targets,
            Err(e) => {
                error!("Failed to load notification targets: {e}");
                return;
            }
        };
        if targets.is_empty() {
            info!("No enabled notification targets configured, skipping batch report");
            return;
        }
        let Some(sender) = self.sender.as_ref() else {
            debug!("No push sender configured, skipping batch report");
            return;
        };

        let mut reports: Vec<(AccountId, String)> = Vec::new();
        for outcome in &batch.results {
            if let Some(report) = self.account_report(outcome).await {
                reports.push((outcome.account_id.clone(), report));
            }
        }

        for target in targets {
            let included: Vec<&String> = reports
                .iter()
                .filter(|(id, _)| target.accepts(id))
                .map(|(_, report)| report)
                .collect();
            if included.is_empty() {
                continue;
            }

            let header = format!(
                "## Batch run: {} succeeded, {} failed, {} skipped\n\n",
                batch.success_count, batch.failed_count, batch.skipped_count
            );
            let content = header
                + &included
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n");
            let message = PushMessage::markdown("RewardLoop · batch report", content);

            if let Err(e) = sender.send(target.uids(), &message).await {
                error!(
                    "Failed to push batch report to target {} ({}): {e}",
                    target.name(),
                    target.id()
                );
                self.system_log.record(
                    LogSource::Runner,
                    LogLevel::Warn,
                    format!("Push to '{}' failed: {e}", target.name()),
                );
            } else {
                info!("Batch report pushed to target {}", target.name());
            }
        }
    }

    /// Render one account's report block: status glyph, earned points, the
    /// delta versus the prior known day, and per-task progress.
    async fn account_report(&self, outcome: &RunOutcome) -> Option<String> {
        let account = match self.account_repo.find_by_id(&outcome.account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => return None,
            Err(e) => {
                error!("Failed to load {} for report: {e}", outcome.account_name);
                return None;
            }
        };
        Some(format_account_report(&account, outcome))
    }

    async fn fan_out<F>(&self, account_ids: &[AccountId], message: &PushMessage, eligible: F)
    where
        F: Fn(&NotificationTarget, &[AccountId]) -> bool,
    {
        let Some(sender) = self.sender.as_ref() else {
            debug!("No push sender configured, skipping notification");
            return;
        };

        let targets = match self.target_repo.find_all_enabled().await {
            Ok(targets) => targets,
            Err(e) => {
                error!("Failed to load notification targets: {e}");
                return;
            }
        };
        if targets.is_empty() {
            info!("No enabled notification targets configured, skipping notification");
            return;
        }

        for target in targets {
            if !eligible(&target, account_ids) {
                continue;
            }
            if let Err(e) = sender.send(target.uids(), message).await {
                error!(
                    "Failed to push report to target {} ({}): {e}",
                    target.name(),
                    target.id()
                );
                self.system_log.record(
                    LogSource::Runner,
                    LogLevel::Warn,
                    format!("Push to '{}' failed: {e}", target.name()),
                );
            } else {
                info!("Report pushed to target {}", target.name());
            }
        }
    }
}

fn format_account_report(account: &Account, outcome: &RunOutcome) -> String {
    let groups = aggregate_by_day(account.point_history().items());
    let day_delta = groups.first().map(|g| g.delta).unwrap_or(0);
    let stats = account.stats();

    let mut lines = vec![
        format!("### {} {}", outcome.status.glyph(), account.name()),
        format!("- Status: {}", outcome.status),
        format!("- Earned this run: {:+}", outcome.earned),
        format!(
            "- Total points: {} ({:+} vs previous day)",
            outcome.total_points, day_delta
        ),
        format!(
            "- Check-in: {} · Read: {}/{} · Daily set: {}/{}",
            if stats.sign_done { "done" } else { "open" },
            stats.read_progress,
            stats.read_max,
            stats.daily_progress,
            stats.daily_max
        ),
    ];
    if let Some(sign) = &outcome.sign {
        lines.push(format!("- Sign calls: {}", sign.summary()));
    }
    if !outcome.message.is_empty() && outcome.status != rewardloop_domain::account::AccountStatus::Success {
        lines.push(format!("- Note: {}", outcome.message));
    }
    lines.join("\n")
}
