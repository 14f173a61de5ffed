use std::time::Instant;
use tracing::info;

use crate::persistence::RepositoryErrorMapper;
use rewardloop_domain::account::Account;
use rewardloop_domain::shared::{AccountId, DomainError};

impl super::SqliteAccountRepository {
    pub(super) async fn save_impl(&self, account: &Account) -> Result<(), DomainError> {
        let start = Instant::now();

        let query = r#"
            INSERT INTO accounts (
                id, name, refresh_token, access_token, token_expires_at,
                status, logs, total_points, stats, point_history,
                enabled, cron_enabled, cron_expression, ignore_risk,
                last_run_at, last_daily_success, last_run_id, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            ON CONFLICT(id) DO UPDATE SET
                name = ?2,
                refresh_token = ?3,
                access_token = ?4,
                token_expires_at = ?5,
                status = ?6,
                logs = ?7,
                total_points = ?8,
                stats = ?9,
                point_history = ?10,
                enabled = ?11,
                cron_enabled = ?12,
                cron_expression = ?13,
                ignore_risk = ?14,
                last_run_at = ?15,
                last_daily_success = ?16,
                last_run_id = ?17
        "#;

        let logs_json = serde_json::to_string(account.logs())
            .map_err(|e| RepositoryErrorMapper::map_json_error(e, "Serialize account logs"))?;
        let stats_json = serde_json::to_string(account.stats())
            .map_err(|e| RepositoryErrorMapper::map_json_error(e, "Serialize account stats"))?;
        let history_json = serde_json::to_string(account.point_history()).map_err(|e| {
            RepositoryErrorMapper::map_json_error(e, "Serialize account point history")
        })?;

        sqlx::query(query)
            .bind(account.id().as_str())
            .bind(account.name())
            .bind(account.refresh_token())
            .bind(account.access_token())
            .bind(account.token_expires_at())
            .bind(account.status().as_str())
            .bind(logs_json)
            .bind(account.total_points())
            .bind(stats_json)
            .bind(history_json)
            .bind(account.is_enabled())
            .bind(account.cron_enabled())
            .bind(account.cron_expression())
            .bind(account.ignore_risk())
            .bind(account.last_run_at())
            .bind(account.last_daily_success())
            .bind(account.last_run_id().map(|id| id.as_str()))
            .bind(account.created_at())
            .execute(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Save account"))?;

        let elapsed = start.elapsed();
        info!(
            "📊 Account saved: {} in {:.2}ms",
            account.id().as_str(),
            elapsed.as_secs_f64() * 1000.0
        );

        Ok(())
    }

    pub(super) async fn delete_impl(&self, id: &AccountId) -> Result<(), DomainError> {
        let query = "DELETE FROM accounts WHERE id = ?1";

        sqlx::query(query)
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Delete account"))?;

        info!("📊 Account deleted: {}", id.as_str());
        Ok(())
    }
}
