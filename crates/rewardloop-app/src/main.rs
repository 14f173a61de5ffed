use std::path::PathBuf;

use rewardloop_app::{bootstrap, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = AppConfig::default();

    // The data directory is the only knob the daemon takes from the
    // environment; everything else arrives through the config object.
    if let Ok(dir) = std::env::var("REWARDLOOP_DATA_DIR") {
        let dir = PathBuf::from(dir);
        config.database_path = dir.join("rewardloop.db").to_string_lossy().into_owned();
        config.snapshot_folder = dir.join("backups").to_string_lossy().into_owned();
        config.log_dir = dir.join("logs").to_string_lossy().into_owned();
    }

    match rewardloop_infrastructure::logging::init_logger(PathBuf::from(&config.log_dir)) {
        Ok(_) => {
            tracing::info!("🚀 RewardLoop starting...");
            tracing::info!("📝 File logging initialized at: {}", config.log_dir);
        }
        Err(e) => {
            eprintln!("⚠️  Failed to initialize file logging: {}", e);
            eprintln!("   Falling back to console logging only");

            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_target(true)
                .with_line_number(true)
                .try_init();
        }
    }

    let context = bootstrap::build(config).await?;
    context.scheduler.start().await;

    tokio::signal::ctrl_c().await?;
    tracing::info!("🛑 Shutting down");
    context.scheduler.shutdown().await;

    Ok(())
}
