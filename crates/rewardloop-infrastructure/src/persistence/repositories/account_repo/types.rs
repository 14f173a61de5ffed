use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;

use crate::persistence::RepositoryErrorMapper;
use rewardloop_domain::account::{Account, AccountParts, AccountStatus, LogRing, TaskStats};
use rewardloop_domain::history::PointHistory;
use rewardloop_domain::shared::{AccountId, DomainError, RunId};

#[derive(FromRow)]
pub(super) struct AccountRow {
    pub id: String,
    pub name: String,
    pub refresh_token: String,
    pub access_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub status: String,
    pub logs: String,
    pub total_points: i64,
    pub stats: String,
    pub point_history: String,
    pub enabled: bool,
    pub cron_enabled: bool,
    pub cron_expression: Option<String>,
    pub ignore_risk: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_daily_success: Option<DateTime<Utc>>,
    pub last_run_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AccountRow {
    pub fn into_account(self) -> Result<Account, DomainError> {
        let status = AccountStatus::from_str(&self.status)?;

        let logs: LogRing = serde_json::from_str(&self.logs)
            .map_err(|e| RepositoryErrorMapper::map_json_error(e, "Deserialize account logs"))?;

        let stats: TaskStats = serde_json::from_str(&self.stats)
            .map_err(|e| RepositoryErrorMapper::map_json_error(e, "Deserialize account stats"))?;

        let point_history: PointHistory =
            serde_json::from_str(&self.point_history).map_err(|e| {
                RepositoryErrorMapper::map_json_error(e, "Deserialize account point history")
            })?;

        Ok(Account::restore(AccountParts {
            id: AccountId::from_string(&self.id),
            name: self.name,
            refresh_token: self.refresh_token,
            access_token: self.access_token,
            token_expires_at: self.token_expires_at,
            status,
            logs,
            total_points: self.total_points,
            stats,
            point_history,
            enabled: self.enabled,
            cron_enabled: self.cron_enabled,
            cron_expression: self.cron_expression,
            ignore_risk: self.ignore_risk,
            last_run_at: self.last_run_at,
            last_daily_success: self.last_daily_success,
            last_run_id: self.last_run_id.as_deref().map(RunId::from_string),
            created_at: self.created_at,
        }))
    }
}
