use async_trait::async_trait;

use super::Account;
use crate::shared::{AccountId, DomainError};

#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Save (upsert) an account aggregate.
    async fn save(&self, account: &Account) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;

    async fn find_by_ids(&self, ids: &[AccountId]) -> Result<Vec<Account>, DomainError>;

    async fn find_all(&self) -> Result<Vec<Account>, DomainError>;

    /// Accounts participating in batch/scheduled runs.
    async fn find_enabled(&self) -> Result<Vec<Account>, DomainError>;

    async fn delete(&self, id: &AccountId) -> Result<(), DomainError>;
}
