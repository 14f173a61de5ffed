use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;

use crate::persistence::RepositoryErrorMapper;
use rewardloop_domain::notification::{NotificationTarget, NotificationTargetRepository};
use rewardloop_domain::shared::{AccountId, DomainError, TargetId};

pub struct SqliteNotificationTargetRepository {
    pool: Arc<SqlitePool>,
}

#[derive(FromRow)]
struct TargetRow {
    id: String,
    name: String,
    uids: String,
    filter_accounts: String,
    enabled: bool,
    created_at: DateTime<Utc>,
}

impl TargetRow {
    fn into_target(self) -> Result<NotificationTarget, DomainError> {
        let uids: Vec<String> = serde_json::from_str(&self.uids)
            .map_err(|e| RepositoryErrorMapper::map_json_error(e, "Deserialize target uids"))?;
        let filter_ids: Vec<String> = serde_json::from_str(&self.filter_accounts)
            .map_err(|e| RepositoryErrorMapper::map_json_error(e, "Deserialize target filter"))?;

        Ok(NotificationTarget::restore(
            TargetId::from_string(&self.id),
            self.name,
            uids,
            filter_ids
                .iter()
                .map(|id| AccountId::from_string(id))
                .collect(),
            self.enabled,
            self.created_at,
        ))
    }
}

impl SqliteNotificationTargetRepository {
    const SELECT_QUERY: &'static str = r#"
            SELECT id, name, uids, filter_accounts, enabled, created_at
            FROM notification_targets
        "#;

    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationTargetRepository for SqliteNotificationTargetRepository {
    async fn save(&self, target: &NotificationTarget) -> Result<(), DomainError> {
        let query = r#"
            INSERT INTO notification_targets (id, name, uids, filter_accounts, enabled, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = ?2,
                uids = ?3,
                filter_accounts = ?4,
                enabled = ?5
        "#;

        let uids_json = serde_json::to_string(target.uids())
            .map_err(|e| RepositoryErrorMapper::map_json_error(e, "Serialize target uids"))?;
        let filter_json = serde_json::to_string(
            &target
                .filter_accounts()
                .iter()
                .map(|id| id.as_str())
                .collect::<Vec<_>>(),
        )
        .map_err(|e| RepositoryErrorMapper::map_json_error(e, "Serialize target filter"))?;

        sqlx::query(query)
            .bind(target.id().as_str())
            .bind(target.name())
            .bind(uids_json)
            .bind(filter_json)
            .bind(target.is_enabled())
            .bind(target.created_at())
            .execute(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Save notification target"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &TargetId) -> Result<Option<NotificationTarget>, DomainError> {
        let query = format!("{} WHERE id = ?1", Self::SELECT_QUERY);

        let row: Option<TargetRow> = sqlx::query_as(&query)
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find target by ID"))?;

        match row {
            Some(row) => Ok(Some(row.into_target()?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<NotificationTarget>, DomainError> {
        let query = format!("{} ORDER BY created_at ASC", Self::SELECT_QUERY);

        let rows: Vec<TargetRow> = sqlx::query_as(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find all targets"))?;

        rows.into_iter().map(|row| row.into_target()).collect()
    }

    async fn find_all_enabled(&self) -> Result<Vec<NotificationTarget>, DomainError> {
        let query = format!(
            "{} WHERE enabled = true ORDER BY created_at ASC",
            Self::SELECT_QUERY
        );

        let rows: Vec<TargetRow> = sqlx::query_as(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Find enabled targets"))?;

        rows.into_iter().map(|row| row.into_target()).collect()
    }

    async fn delete(&self, id: &TargetId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM notification_targets WHERE id = ?1")
            .bind(id.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| RepositoryErrorMapper::map_sqlx_error(e, "Delete notification target"))?;
        Ok(())
    }
}
