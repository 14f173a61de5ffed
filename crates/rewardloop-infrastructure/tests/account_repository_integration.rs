use std::sync::Arc;

use chrono::Utc;
use rewardloop_domain::account::{Account, AccountRepository, AccountStatus, LogLevel};
use rewardloop_infrastructure::persistence::repositories::SqliteAccountRepository;
use rewardloop_infrastructure::persistence::Database;

async fn setup_repo() -> Arc<SqliteAccountRepository> {
    let database = Database::in_memory().await.expect("open in-memory db");
    database.run_migrations().await.expect("run migrations");
    Arc::new(SqliteAccountRepository::new(Arc::new(
        database.pool().clone(),
    )))
}

fn sample_account(name: &str) -> Account {
    Account::new(
        name.to_string(),
        "M.R3_integration_refresh_secret_long_enough".to_string(),
    )
    .expect("create account")
}

#[tokio::test]
async fn save_and_reload_full_state() {
    let repo = setup_repo().await;
    let now = Utc::now();

    let mut account = sample_account("Integration");
    account.set_cron_enabled(true);
    account
        .set_cron_expression(Some("15 7 * * *".to_string()))
        .unwrap();
    account.set_ignore_risk(true);
    account.push_log(LogLevel::Warn, "first warning", now);
    account.record_points(120, now);

    let run_id = account.begin_run(now).unwrap();
    account.finish_run(&run_id, AccountStatus::Success, now);

    repo.save(&account).await.expect("save account");

    let loaded = repo
        .find_by_id(account.id())
        .await
        .expect("find account")
        .expect("account exists");

    assert_eq!(loaded.name(), "Integration");
    assert_eq!(loaded.status(), AccountStatus::Success);
    assert_eq!(loaded.cron_expression(), Some("15 7 * * *"));
    assert!(loaded.cron_enabled());
    assert!(loaded.ignore_risk());
    assert_eq!(loaded.total_points(), 120);
    assert_eq!(loaded.point_history().len(), 1);
    assert_eq!(loaded.logs().len(), 1);
    assert_eq!(loaded.last_run_id(), Some(&run_id));
    assert!(loaded.last_daily_success().is_some());
}

#[tokio::test]
async fn upsert_replaces_existing_row() {
    let repo = setup_repo().await;
    let mut account = sample_account("Mutable");
    repo.save(&account).await.unwrap();

    account.update_name("Renamed".to_string()).unwrap();
    account.set_enabled(false);
    repo.save(&account).await.unwrap();

    let all = repo.find_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name(), "Renamed");
    assert!(!all[0].is_enabled());
}

#[tokio::test]
async fn find_enabled_filters_disabled_accounts() {
    let repo = setup_repo().await;

    let enabled = sample_account("Enabled");
    repo.save(&enabled).await.unwrap();

    let mut disabled = sample_account("Disabled");
    disabled.set_enabled(false);
    repo.save(&disabled).await.unwrap();

    let found = repo.find_enabled().await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name(), "Enabled");
}

#[tokio::test]
async fn find_by_ids_returns_requested_subset() {
    let repo = setup_repo().await;
    let a = sample_account("A");
    let b = sample_account("B");
    let c = sample_account("C");
    for account in [&a, &b, &c] {
        repo.save(account).await.unwrap();
    }

    let found = repo
        .find_by_ids(&[a.id().clone(), c.id().clone()])
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().any(|acc| acc.id() == a.id()));
    assert!(found.iter().any(|acc| acc.id() == c.id()));

    assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_removes_account() {
    let repo = setup_repo().await;
    let account = sample_account("Doomed");
    repo.save(&account).await.unwrap();

    repo.delete(account.id()).await.unwrap();
    assert!(repo.find_by_id(account.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn point_history_round_trips_through_json_column() {
    let repo = setup_repo().await;
    let mut account = sample_account("Historian");

    let base = Utc::now() - chrono::Duration::days(3);
    account.record_points(100, base);
    account.record_points(130, base + chrono::Duration::days(1));
    account.record_points(165, base + chrono::Duration::days(2));
    repo.save(&account).await.unwrap();

    let loaded = repo.find_by_id(account.id()).await.unwrap().unwrap();
    let items = loaded.point_history().items();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].points, 100);
    assert_eq!(items[2].points, 165);
}
