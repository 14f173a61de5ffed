use chrono::Utc;
use log::info;
use std::time::Duration;
use tokio::time::sleep;

use rewardloop_domain::account::{Account, LogLevel};
use rewardloop_domain::gateway::ActivityKind;
use rewardloop_domain::shared::DomainError;

use super::types::{SignOutcome, SubCallOutcome, SubCallStatus, SIGN_STEP_PAUSE_SECS};
use super::to_domain_error;

impl super::TaskRunner {
    /// The sign sequence: three quasi-independent remote calls in order with
    /// small fixed pauses between them. Each probes a different award rule,
    /// so partial failure (typically "already claimed today") is expected
    /// steady-state behavior; the aggregate counts as success when any of
    /// the three landed.
    pub(super) async fn run_sign_sequence(
        &self,
        account: &mut Account,
        token: &str,
    ) -> Result<SignOutcome, DomainError> {
        let heartbeat = self
            .sign_sub_call(account, token, ActivityKind::AppHeartbeat)
            .await?;
        sleep(Duration::from_secs(SIGN_STEP_PAUSE_SECS)).await;

        let bonus = self
            .sign_sub_call(account, token, ActivityKind::MobileBonus)
            .await?;
        sleep(Duration::from_secs(SIGN_STEP_PAUSE_SECS)).await;

        let check_in = self
            .sign_sub_call(account, token, ActivityKind::DailyCheckIn)
            .await?;

        let outcome = SignOutcome {
            heartbeat,
            bonus,
            check_in,
        };

        let now = Utc::now();
        if outcome.any_succeeded() {
            account.push_log(
                LogLevel::Info,
                format!("Sign sequence: +{} points ({})", outcome.points(), outcome.summary()),
                now,
            );
            info!(
                "[{}] Sign sequence: +{} points",
                account.name(),
                outcome.points()
            );
        } else {
            account.push_log(
                LogLevel::Warn,
                format!("Sign sequence claimed nothing ({})", outcome.summary()),
                now,
            );
        }

        Ok(outcome)
    }

    /// One sub-call, independently classified. Risk signals follow the
    /// account's risk policy; any other failure stays local to the sub-call.
    async fn sign_sub_call(
        &self,
        account: &mut Account,
        token: &str,
        kind: ActivityKind,
    ) -> Result<SubCallOutcome, DomainError> {
        match self.gateway.report_activity(token, kind).await {
            Ok(result) if result.already_claimed => {
                account.push_log(
                    LogLevel::Info,
                    format!("{kind}: already claimed today"),
                    Utc::now(),
                );
                Ok(SubCallOutcome {
                    kind,
                    status: SubCallStatus::AlreadyClaimed,
                    points: 0,
                    note: Some("already claimed today".to_string()),
                })
            }
            Ok(result) => Ok(SubCallOutcome {
                kind,
                status: SubCallStatus::Succeeded,
                points: result.points,
                note: None,
            }),
            Err(e) if e.is_risk() => {
                let note = e.to_string();
                self.tolerate_risk(account, e, kind.label())?;
                Ok(SubCallOutcome {
                    kind,
                    status: SubCallStatus::SoftRisk,
                    points: 0,
                    note: Some(note),
                })
            }
            Err(e) => {
                account.push_log(LogLevel::Warn, format!("{kind} failed: {e}"), Utc::now());
                Ok(SubCallOutcome {
                    kind,
                    status: SubCallStatus::Failed,
                    points: 0,
                    note: Some(to_domain_error(e).to_string()),
                })
            }
        }
    }
}
