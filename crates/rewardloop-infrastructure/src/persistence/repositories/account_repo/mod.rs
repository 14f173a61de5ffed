mod mutations;
mod queries;
mod types;

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

use rewardloop_domain::account::{Account, AccountRepository};
use rewardloop_domain::shared::{AccountId, DomainError};

pub struct SqliteAccountRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteAccountRepository {
    const SELECT_QUERY: &'static str = r#"
            SELECT
                id, name, refresh_token, access_token, token_expires_at,
                status, logs, total_points, stats, point_history,
                enabled, cron_enabled, cron_expression, ignore_risk,
                last_run_at, last_daily_success, last_run_id, created_at
            FROM accounts
        "#;

    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountRepository for SqliteAccountRepository {
    async fn save(&self, account: &Account) -> Result<(), DomainError> {
        self.save_impl(account).await
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        self.find_by_id_impl(id).await
    }

    async fn find_by_ids(&self, ids: &[AccountId]) -> Result<Vec<Account>, DomainError> {
        self.find_by_ids_impl(ids).await
    }

    async fn find_all(&self) -> Result<Vec<Account>, DomainError> {
        self.find_all_impl().await
    }

    async fn find_enabled(&self) -> Result<Vec<Account>, DomainError> {
        self.find_enabled_impl().await
    }

    async fn delete(&self, id: &AccountId) -> Result<(), DomainError> {
        self.delete_impl(id).await
    }
}
