pub mod application;
pub mod bootstrap;

pub use application::config::{AppConfig, ConfigService, SyncRemote};
pub use bootstrap::AppContext;
