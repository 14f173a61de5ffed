use async_trait::async_trait;

use super::NotificationTarget;
use crate::shared::{DomainError, TargetId};

#[async_trait]
pub trait NotificationTargetRepository: Send + Sync {
    async fn save(&self, target: &NotificationTarget) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &TargetId) -> Result<Option<NotificationTarget>, DomainError>;

    async fn find_all(&self) -> Result<Vec<NotificationTarget>, DomainError>;

    async fn find_all_enabled(&self) -> Result<Vec<NotificationTarget>, DomainError>;

    async fn delete(&self, id: &TargetId) -> Result<(), DomainError>;
}
