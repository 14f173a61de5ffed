use std::time::Instant;
use tracing::info;

use super::types::AccountRow;
use crate::persistence::RepositoryErrorMapper;
use rewardloop_domain::account::Account;
use rewardloop_domain::shared::{AccountId, DomainError};

impl super::SqliteAccountRepository {
    pub(super) async fn find_by_id_impl(
        &self,
        id: &AccountId,
    ) -> Result<Option<Account>, DomainError> {
        let query = format!(
            r#"
            {}
            WHERE id = ?1
        "#,
            Self::SELECT_QUERY
        );

        let row: Option<AccountRow> = sqlx::query_as(&query)
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find account by ID"))?;

        match row {
            Some(row) => Ok(Some(row.into_account()?)),
            None => Ok(None),
        }
    }

    pub(super) async fn find_by_ids_impl(
        &self,
        ids: &[AccountId],
    ) -> Result<Vec<Account>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strings: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        let placeholders = (1..=id_strings.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(",");

        let query = format!(
            r#"
            {}
            WHERE id IN ({})
        "#,
            Self::SELECT_QUERY,
            placeholders
        );

        let mut query_builder = sqlx::query_as::<_, AccountRow>(&query);
        for id_str in &id_strings {
            query_builder = query_builder.bind(id_str);
        }

        let rows: Vec<AccountRow> = query_builder
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find accounts by IDs"))?;

        rows.into_iter().map(|row| row.into_account()).collect()
    }

    pub(super) async fn find_all_impl(&self) -> Result<Vec<Account>, DomainError> {
        let start = Instant::now();

        let query = format!(
            r#"
            {}
            ORDER BY created_at ASC
        "#,
            Self::SELECT_QUERY
        );

        let rows: Vec<AccountRow> = sqlx::query_as(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find all accounts"))?;

        let count = rows.len();

        // Graceful degradation: if one account fails to load (e.g. a corrupt
        // JSON column), log it and continue with the others.
        let accounts: Vec<Account> = rows
            .into_iter()
            .filter_map(|row| match row.into_account() {
                Ok(account) => Some(account),
                Err(e) => {
                    tracing::error!("Failed to load account: {}", e);
                    None
                }
            })
            .collect();

        info!(
            "📊 find_all(): {:.2}ms, {} accounts loaded",
            start.elapsed().as_secs_f64() * 1000.0,
            count
        );

        Ok(accounts)
    }

    pub(super) async fn find_enabled_impl(&self) -> Result<Vec<Account>, DomainError> {
        let query = format!(
            r#"
            {}
            WHERE enabled = true
            ORDER BY created_at ASC
        "#,
            Self::SELECT_QUERY
        );

        let rows: Vec<AccountRow> = sqlx::query_as(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find enabled accounts"))?;

        let accounts = rows
            .into_iter()
            .filter_map(|row| match row.into_account() {
                Ok(account) => Some(account),
                Err(e) => {
                    tracing::error!("Failed to load enabled account: {}", e);
                    None
                }
            })
            .collect();

        Ok(accounts)
    }
}
