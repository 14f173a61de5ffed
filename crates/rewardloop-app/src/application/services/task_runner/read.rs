use chrono::Utc;
use log::debug;

use rewardloop_domain::account::{Account, LogLevel};
use rewardloop_domain::gateway::ActivityKind;
use rewardloop_domain::shared::DomainError;

use super::types::{ReadOutcome, READ_LOOP_CAP};
use super::to_domain_error;
use crate::application::config::AppConfig;

impl super::TaskRunner {
    /// Read loop: submit read activities while local progress trails the
    /// dashboard-reported maximum. Progress is incremented optimistically on
    /// each accepted call; the loop is hard-capped so a misreported maximum
    /// cannot run away.
    pub(super) async fn run_read_loop(
        &self,
        account: &mut Account,
        token: &str,
        config: &AppConfig,
    ) -> Result<ReadOutcome, DomainError> {
        let mut iterations = 0u32;

        while iterations < READ_LOOP_CAP && !account.stats().read_complete() {
            match self
                .gateway
                .report_activity(token, ActivityKind::ReadArticle)
                .await
            {
                Ok(result) => {
                    account.bump_read_progress();
                    iterations += 1;
                    debug!(
                        "[{}] Read {}/{} (+{} points)",
                        account.name(),
                        account.stats().read_progress,
                        account.stats().read_max,
                        result.points
                    );
                }
                Err(e) if e.is_risk() => {
                    // Tolerated soft risk stops the loop rather than keep
                    // hammering a throttled endpoint; the run itself goes on.
                    self.tolerate_risk(account, e, "read loop")?;
                    break;
                }
                Err(e) => return Err(to_domain_error(e)),
            }

            if iterations < READ_LOOP_CAP && !account.stats().read_complete() {
                self.human_delay(config).await;
            }
        }

        let completed = account.stats().read_complete();
        account.push_log(
            LogLevel::Info,
            format!(
                "Read loop: {} iterations, progress {}/{}",
                iterations,
                account.stats().read_progress,
                account.stats().read_max
            ),
            Utc::now(),
        );

        Ok(ReadOutcome {
            iterations,
            completed,
        })
    }
}
