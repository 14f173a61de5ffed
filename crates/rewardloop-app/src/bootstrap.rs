use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use rewardloop_domain::account::AccountRepository;
use rewardloop_domain::gateway::RewardsGateway;
use rewardloop_domain::notification::{NotificationTargetRepository, PushSender};
use rewardloop_infrastructure::http::HttpRewardsGateway;
use rewardloop_infrastructure::notification::PushApiSender;
use rewardloop_infrastructure::persistence::repositories::{
    SqliteAccountRepository, SqliteNotificationTargetRepository,
};
use rewardloop_infrastructure::persistence::Database;

use crate::application::config::{AppConfig, ConfigService};
use crate::application::services::{
    BackupService, CredentialService, NotificationRouter, Scheduler, SystemLog, TaskRunner,
};

/// Fully wired application: repositories, services, and the scheduler.
pub struct AppContext {
    pub config: Arc<ConfigService>,
    pub system_log: Arc<SystemLog>,
    pub accounts: Arc<dyn AccountRepository>,
    pub targets: Arc<dyn NotificationTargetRepository>,
    pub credentials: Arc<CredentialService>,
    pub runner: Arc<TaskRunner>,
    pub router: Arc<NotificationRouter>,
    pub backup: Arc<BackupService>,
    pub scheduler: Arc<Scheduler>,
}

/// Open the database, run migrations, and wire every service together.
pub async fn build(app_config: AppConfig) -> Result<AppContext> {
    let database = Database::new(&app_config.database_path)
        .await
        .context("Failed to open database")?;
    database
        .run_migrations()
        .await
        .context("Failed to run migrations")?;
    let pool = Arc::new(database.pool().clone());
    info!("💾 Database ready at {}", app_config.database_path);

    let accounts: Arc<dyn AccountRepository> = Arc::new(SqliteAccountRepository::new(pool.clone()));
    let targets: Arc<dyn NotificationTargetRepository> =
        Arc::new(SqliteNotificationTargetRepository::new(pool));

    let gateway: Arc<dyn RewardsGateway> = Arc::new(
        HttpRewardsGateway::new(app_config.gateway.clone())
            .context("Failed to create rewards gateway")?,
    );

    let push_sender: Option<Arc<dyn PushSender>> = match &app_config.push {
        Some(push_config) => Some(Arc::new(
            PushApiSender::new(push_config.clone())
                .context("Failed to create push sender")?,
        )),
        None => {
            info!("No push collaborator configured; notifications disabled");
            None
        }
    };

    let config = Arc::new(ConfigService::new(app_config));
    let system_log = Arc::new(SystemLog::new());
    let credentials = Arc::new(CredentialService::new(gateway.clone()));

    let runner = TaskRunner::new(
        gateway,
        accounts.clone(),
        credentials.clone(),
        config.clone(),
        system_log.clone(),
    );

    let router = Arc::new(NotificationRouter::new(
        targets.clone(),
        accounts.clone(),
        push_sender,
        config.clone(),
        system_log.clone(),
    ));

    let backup = Arc::new(BackupService::new(
        accounts.clone(),
        config.clone(),
        system_log.clone(),
    ));

    let scheduler = Scheduler::new(
        config.clone(),
        accounts.clone(),
        runner.clone(),
        router.clone(),
        backup.clone(),
        system_log.clone(),
    );

    Ok(AppContext {
        config,
        system_log,
        accounts,
        targets,
        credentials,
        runner,
        router,
        backup,
        scheduler,
    })
}
