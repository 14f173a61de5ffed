mod account_repo;
mod target_repo;

pub use account_repo::SqliteAccountRepository;
pub use target_repo::SqliteNotificationTargetRepository;
