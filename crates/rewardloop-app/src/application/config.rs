use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

use rewardloop_domain::schedule::ScheduleEntry;
use rewardloop_infrastructure::http::GatewayConfig;
use rewardloop_infrastructure::notification::PushApiConfig;
use rewardloop_infrastructure::sync::CloudSyncConfig;

/// One cloud-sync remote with its own schedule entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRemote {
    pub name: String,
    pub schedule: ScheduleEntry,
    pub remote: CloudSyncConfig,
}

/// Runtime configuration. Loading and migrating a persisted config file is
/// the host's job; this object is handed in at bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Human-like delay bounds between network calls, whole seconds.
    pub delay_min_secs: u64,
    pub delay_max_secs: u64,
    /// Minutes before a finished account drops back to idle; 0 disables.
    pub idle_reset_minutes: u64,
    /// Pause between accounts in a batch run.
    pub batch_account_delay_secs: u64,
    /// Skip accounts that already succeeded today during scheduled batches.
    pub skip_completed: bool,
    /// Push reports for single-account completions (batches always push).
    pub allow_single_push: bool,
    /// Global task cadence; also the fallback for per-account schedules.
    pub task_schedule: ScheduleEntry,
    /// Local snapshot export cadence.
    pub backup_schedule: ScheduleEntry,
    /// Cloud-sync remotes, each with its own cadence.
    pub sync_remotes: Vec<SyncRemote>,
    pub database_path: String,
    pub snapshot_folder: String,
    pub log_dir: String,
    pub gateway: GatewayConfig,
    pub push: Option<PushApiConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            delay_min_secs: 5,
            delay_max_secs: 15,
            idle_reset_minutes: 5,
            batch_account_delay_secs: 30,
            skip_completed: true,
            allow_single_push: false,
            task_schedule: ScheduleEntry::restore("0 9 * * *".to_string(), false, None),
            backup_schedule: ScheduleEntry::restore("30 3 * * *".to_string(), false, None),
            sync_remotes: Vec::new(),
            database_path: data_dir.join("rewardloop.db").to_string_lossy().into_owned(),
            snapshot_folder: data_dir.join("backups").to_string_lossy().into_owned(),
            log_dir: data_dir.join("logs").to_string_lossy().into_owned(),
            gateway: GatewayConfig::default(),
            push: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rewardloop")
}

impl AppConfig {
    /// Delay bounds normalized so min never exceeds max.
    pub fn delay_bounds(&self) -> (u64, u64) {
        if self.delay_min_secs <= self.delay_max_secs {
            (self.delay_min_secs, self.delay_max_secs)
        } else {
            (self.delay_max_secs, self.delay_min_secs)
        }
    }
}

/// Shared config holder. Single writer at a time through `update`; readers
/// take cheap snapshots.
pub struct ConfigService {
    config: RwLock<AppConfig>,
}

impl ConfigService {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    pub async fn update<F>(&self, mutate: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.config.write().await;
        mutate(&mut guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedules_start_disabled() {
        let config = AppConfig::default();
        assert!(!config.task_schedule.is_enabled());
        assert!(!config.backup_schedule.is_enabled());
        assert!(config.sync_remotes.is_empty());
    }

    #[test]
    fn test_delay_bounds_normalized() {
        let mut config = AppConfig::default();
        config.delay_min_secs = 20;
        config.delay_max_secs = 5;
        assert_eq!(config.delay_bounds(), (5, 20));
    }

    #[tokio::test]
    async fn test_update_is_visible_to_readers() {
        let service = ConfigService::new(AppConfig::default());
        service.update(|c| c.skip_completed = false).await;
        assert!(!service.get().await.skip_completed);
    }
}
