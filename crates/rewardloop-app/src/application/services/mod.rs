mod backup_service;
mod credential_service;
#[cfg(test)]
pub(crate) mod test_support;
mod notification_router;
mod scheduler;
mod system_log;
mod task_runner;

pub use backup_service::BackupService;
pub use credential_service::{CredentialService, TOKEN_REFRESH_THRESHOLD_MINUTES};
pub use notification_router::NotificationRouter;
pub use scheduler::Scheduler;
pub use system_log::{LogSource, SystemLog, SystemLogEntry};
pub use task_runner::{
    BatchOutcome, ReadOutcome, RunMode, RunOutcome, SignOutcome, SubCallOutcome, SubCallStatus,
    TaskRunner, READ_LOOP_CAP,
};
