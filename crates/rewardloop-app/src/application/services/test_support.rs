//! Shared fakes for service tests: an in-memory account repository and a
//! scriptable rewards gateway.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rewardloop_domain::account::{Account, AccountRepository};
use rewardloop_domain::gateway::{
    ActivityKind, ActivityOutcome, ApiError, DashboardSnapshot, RewardsGateway, TaskProgress,
    TokenGrant,
};
use rewardloop_domain::notification::{
    NotificationTarget, NotificationTargetRepository, PushMessage, PushSender,
};
use rewardloop_domain::shared::{AccountId, DomainError, TargetId};

use super::credential_service::CredentialService;
use super::system_log::SystemLog;
use super::task_runner::TaskRunner;
use crate::application::config::{AppConfig, ConfigService};

/// Insertion-ordered in-memory account store.
pub(crate) struct InMemoryAccountRepository {
    accounts: Mutex<Vec<Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn save(&self, account: &Account) -> Result<(), DomainError> {
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        if let Some(existing) = accounts.iter_mut().find(|a| a.id() == account.id()) {
            *existing = account.clone();
        } else {
            accounts.push(account.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        Ok(accounts.iter().find(|a| a.id() == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[AccountId]) -> Result<Vec<Account>, DomainError> {
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        Ok(accounts
            .iter()
            .filter(|a| ids.contains(a.id()))
            .cloned()
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Account>, DomainError> {
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        Ok(accounts.clone())
    }

    async fn find_enabled(&self) -> Result<Vec<Account>, DomainError> {
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        Ok(accounts.iter().filter(|a| a.is_enabled()).cloned().collect())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), DomainError> {
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        accounts.retain(|a| a.id() != id);
        Ok(())
    }
}

/// In-memory notification target store.
pub(crate) struct InMemoryTargetRepository {
    targets: Mutex<Vec<NotificationTarget>>,
}

impl InMemoryTargetRepository {
    pub fn new() -> Self {
        Self {
            targets: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NotificationTargetRepository for InMemoryTargetRepository {
    async fn save(&self, target: &NotificationTarget) -> Result<(), DomainError> {
        let mut targets = self
            .targets
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        if let Some(existing) = targets.iter_mut().find(|t| t.id() == target.id()) {
            *existing = target.clone();
        } else {
            targets.push(target.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &TargetId) -> Result<Option<NotificationTarget>, DomainError> {
        let targets = self
            .targets
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        Ok(targets.iter().find(|t| t.id() == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<NotificationTarget>, DomainError> {
        let targets = self
            .targets
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        Ok(targets.clone())
    }

    async fn find_all_enabled(&self) -> Result<Vec<NotificationTarget>, DomainError> {
        let targets = self
            .targets
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        Ok(targets.iter().filter(|t| t.is_enabled()).cloned().collect())
    }

    async fn delete(&self, id: &TargetId) -> Result<(), DomainError> {
        let mut targets = self
            .targets
            .lock()
            .map_err(|_| DomainError::Repository("store poisoned".to_string()))?;
        targets.retain(|t| t.id() != id);
        Ok(())
    }
}

/// Push sender that records deliveries instead of sending them.
pub(crate) struct RecordingSender {
    sent: Mutex<Vec<(Vec<String>, PushMessage)>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(Vec<String>, PushMessage)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(&self, recipients: &[String], message: &PushMessage) -> Result<(), DomainError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((recipients.to_vec(), message.clone()));
        }
        Ok(())
    }

    async fn test(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Points awarded per activity kind by the fake gateway.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActivityKindPoints {
    pub heartbeat: i64,
    pub bonus: i64,
    pub check_in: i64,
    pub read: i64,
}

#[derive(Default)]
struct FakeGatewayState {
    dashboards: VecDeque<Result<DashboardSnapshot, ApiError>>,
    activity_overrides: VecDeque<Result<ActivityOutcome, ApiError>>,
    activity_points: ActivityKindPoints,
    activity_calls: Vec<ActivityKind>,
    refresh_order: Vec<String>,
}

/// Scriptable gateway: queued dashboard responses (falling back to an empty
/// snapshot) and per-kind activity awards.
#[derive(Clone)]
pub(crate) struct FakeGateway {
    state: Arc<Mutex<FakeGatewayState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeGatewayState::default())),
        }
    }

    pub fn push_dashboard(&self, response: Result<DashboardSnapshot, ApiError>) {
        if let Ok(mut state) = self.state.lock() {
            state.dashboards.push_back(response);
        }
    }

    pub fn push_activity(&self, response: Result<ActivityOutcome, ApiError>) {
        if let Ok(mut state) = self.state.lock() {
            state.activity_overrides.push_back(response);
        }
    }

    pub fn set_activity_points(&self, points: ActivityKindPoints) {
        if let Ok(mut state) = self.state.lock() {
            state.activity_points = points;
        }
    }

    pub fn activity_calls(&self) -> Vec<ActivityKind> {
        self.state
            .lock()
            .map(|state| state.activity_calls.clone())
            .unwrap_or_default()
    }

    pub fn refresh_order(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.refresh_order.clone())
            .unwrap_or_default()
    }

    fn empty_snapshot() -> DashboardSnapshot {
        DashboardSnapshot {
            total_points: 0,
            check_in_done: false,
            read: TaskProgress::default(),
            daily_set: TaskProgress::default(),
            promotions: Vec::new(),
            fetched_at: Utc::now(),
        }
    }
}

#[async_trait]
impl RewardsGateway for FakeGateway {
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenGrant, ApiError> {
        if let Ok(mut state) = self.state.lock() {
            state.refresh_order.push(refresh_token.to_string());
        }
        Ok(TokenGrant {
            access_token: "fake-access-token".to_string(),
            refresh_token: format!("{refresh_token}.rotated"),
            expires_in: 3600,
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ApiError> {
        Ok(TokenGrant {
            access_token: format!("access-for-{code}"),
            refresh_token: format!("M.R3_refresh_for_{code}"),
            expires_in: 3600,
        })
    }

    async fn fetch_dashboard(&self, _access_token: &str) -> Result<DashboardSnapshot, ApiError> {
        let queued = self
            .state
            .lock()
            .ok()
            .and_then(|mut state| state.dashboards.pop_front());
        match queued {
            Some(response) => response,
            None => Ok(Self::empty_snapshot()),
        }
    }

    async fn report_activity(
        &self,
        _access_token: &str,
        kind: ActivityKind,
    ) -> Result<ActivityOutcome, ApiError> {
        let Ok(mut state) = self.state.lock() else {
            return Ok(ActivityOutcome {
                points: 0,
                already_claimed: false,
            });
        };
        state.activity_calls.push(kind);
        if let Some(response) = state.activity_overrides.pop_front() {
            return response;
        }
        let points = match kind {
            ActivityKind::AppHeartbeat => state.activity_points.heartbeat,
            ActivityKind::MobileBonus => state.activity_points.bonus,
            ActivityKind::DailyCheckIn => state.activity_points.check_in,
            ActivityKind::ReadArticle => state.activity_points.read,
        };
        Ok(ActivityOutcome {
            points,
            already_claimed: false,
        })
    }
}

/// Zero-delay config so service tests run instantly.
pub(crate) fn fast_config() -> AppConfig {
    AppConfig {
        delay_min_secs: 0,
        delay_max_secs: 0,
        batch_account_delay_secs: 0,
        idle_reset_minutes: 0,
        ..AppConfig::default()
    }
}

/// Wire a task runner over the fake gateway and an in-memory store.
pub(crate) fn test_context(
    gateway: FakeGateway,
) -> (Arc<TaskRunner>, Arc<InMemoryAccountRepository>) {
    let repo = Arc::new(InMemoryAccountRepository::new());
    let gateway: Arc<dyn RewardsGateway> = Arc::new(gateway);
    let credentials = Arc::new(CredentialService::new(gateway.clone()));
    let config = Arc::new(ConfigService::new(fast_config()));
    let system_log = Arc::new(SystemLog::new());
    let runner = TaskRunner::new(
        gateway,
        repo.clone() as Arc<dyn AccountRepository>,
        credentials,
        config,
        system_log,
    );
    (runner, repo)
}
