mod aggregate;
mod repository;
mod value_objects;

pub use aggregate::{Account, AccountParts};
pub use repository::AccountRepository;
pub use value_objects::{AccountStatus, LogEntry, LogLevel, LogRing, TaskStats};
