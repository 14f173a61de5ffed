/// E2E test: run state machine against real persistence.
///
/// 1. Create and persist an account
/// 2. Begin a run (running state persisted)
/// 3. Record dashboard readings into history
/// 4. Finish the run and verify the success stamp
/// 5. Verify a stale run id cannot reset the account
use std::sync::Arc;

use chrono::Utc;
use rewardloop_domain::account::{Account, AccountRepository, AccountStatus};
use rewardloop_infrastructure::persistence::repositories::SqliteAccountRepository;
use rewardloop_infrastructure::persistence::Database;

#[tokio::test]
async fn e2e_run_state_flow() {
    // ============================================================
    // Setup: database and repository
    // ============================================================
    let database = Database::in_memory().await.expect("open in-memory db");
    database.run_migrations().await.expect("run migrations");
    let repo: Arc<dyn AccountRepository> = Arc::new(SqliteAccountRepository::new(Arc::new(
        database.pool().clone(),
    )));

    // ============================================================
    // Step 1: create account
    // ============================================================
    let account = Account::new(
        "E2E Account".to_string(),
        "M.R3_e2e_refresh_secret_long_enough_for_validation".to_string(),
    )
    .expect("create account");
    repo.save(&account).await.expect("save account");
    let account_id = account.id().clone();

    println!("✓ Step 1: Account created with ID: {}", account_id.as_str());

    // ============================================================
    // Step 2: begin a run; the running gate must persist
    // ============================================================
    let mut account = repo
        .find_by_id(&account_id)
        .await
        .expect("load account")
        .expect("account exists");
    let now = Utc::now();
    let run_id = account.begin_run(now).expect("begin run");
    repo.save(&account).await.expect("save running state");

    let reloaded = repo.find_by_id(&account_id).await.unwrap().unwrap();
    assert_eq!(reloaded.status(), AccountStatus::Running);
    // A concurrent start against the persisted state is rejected.
    let mut concurrent = reloaded.clone();
    assert!(concurrent.begin_run(Utc::now()).is_err());

    println!("✓ Step 2: Running state persisted and gated");

    // ============================================================
    // Step 3: record readings into the bounded history
    // ============================================================
    account.record_points(100, now);
    account.record_points(105, now + chrono::Duration::minutes(5));
    repo.save(&account).await.expect("save history");

    println!("✓ Step 3: History recorded");

    // ============================================================
    // Step 4: finish with success
    // ============================================================
    let finished_at = now + chrono::Duration::minutes(6);
    assert!(account.finish_run(&run_id, AccountStatus::Success, finished_at));
    repo.save(&account).await.expect("save finished state");

    let reloaded = repo.find_by_id(&account_id).await.unwrap().unwrap();
    assert_eq!(reloaded.status(), AccountStatus::Success);
    assert_eq!(reloaded.total_points(), 105);
    assert_eq!(reloaded.point_history().len(), 2);
    assert!(reloaded.succeeded_on(finished_at.date_naive()));

    println!("✓ Step 4: Success stamp persisted");

    // ============================================================
    // Step 5: a newer run invalidates the old idle-reset key
    // ============================================================
    let mut account = reloaded;
    let newer_run = account.begin_run(Utc::now()).expect("second run");
    account.finish_run(&newer_run, AccountStatus::Error, Utc::now());
    repo.save(&account).await.unwrap();

    let mut reloaded = repo.find_by_id(&account_id).await.unwrap().unwrap();
    assert!(!reloaded.reset_to_idle_if(&run_id), "stale run id must not reset");
    assert!(reloaded.reset_to_idle_if(&newer_run));
    repo.save(&reloaded).await.unwrap();

    let final_state = repo.find_by_id(&account_id).await.unwrap().unwrap();
    assert_eq!(final_state.status(), AccountStatus::Idle);

    println!("✓ Step 5: Idle reset keyed by run id");
}
