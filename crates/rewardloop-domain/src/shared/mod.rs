use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn from_string(s: &str) -> Self {
                Self(s.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(AccountId);
define_id!(TargetId);
define_id!(RunId);

/// Error codes for structured error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication & Credentials (1xxx)
    InvalidCredentials = 1001,
    TokenRefused = 1002,

    // Resource Not Found (2xxx)
    AccountNotFound = 2001,
    TargetNotFound = 2002,

    // Business Logic (3xxx)
    AlreadyRunning = 3001,
    TaskFailed = 3002,
    RiskDetected = 3003,
    AccountDisabled = 3004,
    InvalidCron = 3005,

    // Data & Persistence (4xxx)
    RepositoryError = 4001,
    DataIntegrityError = 4002,
    SerializationError = 4003,

    // Infrastructure (5xxx)
    InfrastructureError = 5001,
    NetworkError = 5002,
    TimeoutError = 5003,

    // Validation (6xxx)
    ValidationError = 6001,
    InvalidInput = 6002,
}

impl ErrorCode {
    /// Get error code as integer
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorCode::InvalidCredentials
            | ErrorCode::TokenRefused
            | ErrorCode::TaskFailed
            | ErrorCode::NetworkError => ErrorSeverity::Warning,

            ErrorCode::AccountNotFound
            | ErrorCode::TargetNotFound
            | ErrorCode::AlreadyRunning
            | ErrorCode::ValidationError
            | ErrorCode::InvalidInput => ErrorSeverity::Info,

            ErrorCode::RiskDetected
            | ErrorCode::DataIntegrityError
            | ErrorCode::InfrastructureError => ErrorSeverity::Error,

            _ => ErrorSeverity::Warning,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NetworkError
                | ErrorCode::TimeoutError
                | ErrorCode::TaskFailed
                | ErrorCode::TokenRefused
        )
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Token refresh refused: {0}")]
    TokenRefused(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Notification target not found: {0}")]
    TargetNotFound(String),

    #[error("Account is already running: {0}")]
    AlreadyRunning(String),

    #[error("Task run failed: {0}")]
    TaskFailed(String),

    #[error("Risk signal detected: {0}")]
    RiskDetected(String),

    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Infrastructure error: {0}")]
    Infrastructure(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl DomainError {
    /// Get error code
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::InvalidCredentials(_) => ErrorCode::InvalidCredentials,
            DomainError::TokenRefused(_) => ErrorCode::TokenRefused,
            DomainError::AccountNotFound(_) => ErrorCode::AccountNotFound,
            DomainError::TargetNotFound(_) => ErrorCode::TargetNotFound,
            DomainError::AlreadyRunning(_) => ErrorCode::AlreadyRunning,
            DomainError::TaskFailed(_) => ErrorCode::TaskFailed,
            DomainError::RiskDetected(_) => ErrorCode::RiskDetected,
            DomainError::InvalidCron(_) => ErrorCode::InvalidCron,
            DomainError::Repository(_) => ErrorCode::RepositoryError,
            DomainError::Infrastructure(_) => ErrorCode::InfrastructureError,
            DomainError::Validation(_) => ErrorCode::ValidationError,
            DomainError::DataIntegrity(_) => ErrorCode::DataIntegrityError,
            DomainError::InvalidInput(_) => ErrorCode::InvalidInput,
            DomainError::Serialization(_) => ErrorCode::SerializationError,
            DomainError::Deserialization(_) => ErrorCode::SerializationError,
            DomainError::NotFound(_) => ErrorCode::AccountNotFound,
        }
    }

    /// Get error severity
    pub fn severity(&self) -> ErrorSeverity {
        self.code().severity()
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        self.code().is_recoverable()
    }

    /// Format error with code
    pub fn format_with_code(&self) -> String {
        format!("[{}] {}", self.code().code(), self)
    }
}
