use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::{AccountId, DomainError, TargetId};

/// NotificationTarget aggregate root.
///
/// A target names a set of push recipients and subscribes to a set of
/// accounts; an empty subscription list means "all accounts". Many targets
/// may subscribe to overlapping account sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationTarget {
    id: TargetId,
    name: String,
    uids: Vec<String>,
    filter_accounts: Vec<AccountId>,
    enabled: bool,
    created_at: DateTime<Utc>,
}

impl NotificationTarget {
    pub fn new(name: String, uids: Vec<String>) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::Validation(
                "Target name cannot be empty".to_string(),
            ));
        }
        let uids: Vec<String> = uids
            .into_iter()
            .map(|uid| uid.trim().to_string())
            .filter(|uid| !uid.is_empty())
            .collect();
        if uids.is_empty() {
            return Err(DomainError::Validation(
                "Target needs at least one recipient uid".to_string(),
            ));
        }

        Ok(Self {
            id: TargetId::new(),
            name: name.trim().to_string(),
            uids,
            filter_accounts: Vec::new(),
            enabled: true,
            created_at: Utc::now(),
        })
    }

    /// Reconstruct from persistence.
    pub fn restore(
        id: TargetId,
        name: String,
        uids: Vec<String>,
        filter_accounts: Vec<AccountId>,
        enabled: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            uids,
            filter_accounts,
            enabled,
            created_at,
        }
    }

    // Getters

    pub fn id(&self) -> &TargetId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uids(&self) -> &[String] {
        &self.uids
    }

    pub fn filter_accounts(&self) -> &[AccountId] {
        &self.filter_accounts
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    // Business methods

    /// Subscription check: empty allow-list accepts every account.
    pub fn accepts(&self, account_id: &AccountId) -> bool {
        self.filter_accounts.is_empty() || self.filter_accounts.contains(account_id)
    }

    /// Accepts at least one of the given accounts.
    pub fn accepts_any(&self, account_ids: &[AccountId]) -> bool {
        self.filter_accounts.is_empty()
            || account_ids.iter().any(|id| self.filter_accounts.contains(id))
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn set_filter_accounts(&mut self, filter_accounts: Vec<AccountId>) {
        self.filter_accounts = filter_accounts;
    }

    pub fn update_uids(&mut self, uids: Vec<String>) -> Result<(), DomainError> {
        let uids: Vec<String> = uids
            .into_iter()
            .map(|uid| uid.trim().to_string())
            .filter(|uid| !uid.is_empty())
            .collect();
        if uids.is_empty() {
            return Err(DomainError::Validation(
                "Target needs at least one recipient uid".to_string(),
            ));
        }
        self.uids = uids;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_target() {
        let target =
            NotificationTarget::new("Family".to_string(), vec!["UID_abc".to_string()]).unwrap();
        assert!(target.is_enabled());
        assert_eq!(target.uids(), ["UID_abc".to_string()]);
    }

    #[test]
    fn test_rejects_empty_recipients() {
        assert!(NotificationTarget::new("Family".to_string(), vec![]).is_err());
        assert!(
            NotificationTarget::new("Family".to_string(), vec!["  ".to_string()]).is_err()
        );
    }

    #[test]
    fn test_empty_filter_accepts_all() {
        let target =
            NotificationTarget::new("All".to_string(), vec!["UID_abc".to_string()]).unwrap();
        assert!(target.accepts(&AccountId::new()));
    }

    #[test]
    fn test_filter_restricts_accounts() {
        let mut target =
            NotificationTarget::new("Some".to_string(), vec!["UID_abc".to_string()]).unwrap();
        let subscribed = AccountId::new();
        let other = AccountId::new();
        target.set_filter_accounts(vec![subscribed.clone()]);

        assert!(target.accepts(&subscribed));
        assert!(!target.accepts(&other));
        assert!(target.accepts_any(&[other.clone(), subscribed.clone()]));
        assert!(!target.accepts_any(&[other]));
    }

    #[test]
    fn test_enable_disable() {
        let mut target =
            NotificationTarget::new("T".to_string(), vec!["UID_abc".to_string()]).unwrap();
        target.disable();
        assert!(!target.is_enabled());
        target.enable();
        assert!(target.is_enabled());
    }
}
