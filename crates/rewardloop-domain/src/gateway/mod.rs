use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a token refresh or one-time code exchange.
///
/// The remote rotates the long-lived secret on every grant, so callers must
/// persist `refresh_token` even when they only wanted `access_token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub progress: u32,
    pub max: u32,
}

impl TaskProgress {
    pub fn complete(&self) -> bool {
        self.max > 0 && self.progress >= self.max
    }
}

/// Typed classification of a dashboard promotion.
///
/// Offers are matched to a known kind by offer-id / content-class patterns;
/// anything unmatched stays `Unknown` instead of bleeding into typed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionKind {
    DailyCheckIn,
    ReadArticle,
    MobileBonus,
    DailySet,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub offer_id: String,
    pub kind: PromotionKind,
    pub progress: u32,
    pub max: u32,
    pub points: i64,
    pub complete: bool,
}

/// Dashboard read: balance plus per-task progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub total_points: i64,
    /// Daily check-in already claimed today.
    pub check_in_done: bool,
    pub read: TaskProgress,
    pub daily_set: TaskProgress,
    /// Full decoded promotion list, `Unknown` entries included.
    pub promotions: Vec<Promotion>,
    pub fetched_at: DateTime<Utc>,
}

/// The remote operations submitted through the generic activity envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// App-activity heartbeat opening the mobile award rules.
    AppHeartbeat,
    /// Mobile daily bonus claim.
    MobileBonus,
    /// Daily check-in claim.
    DailyCheckIn,
    /// One read-task increment.
    ReadArticle,
}

impl ActivityKind {
    /// Wire value for the envelope `type` field.
    pub fn activity_type(&self) -> &'static str {
        match self {
            ActivityKind::AppHeartbeat => "101",
            ActivityKind::MobileBonus => "102",
            ActivityKind::DailyCheckIn => "101",
            ActivityKind::ReadArticle => "10",
        }
    }

    /// Offer attribute submitted with the envelope.
    pub fn attributes(&self) -> &'static str {
        match self {
            ActivityKind::AppHeartbeat => "app_activity",
            ActivityKind::MobileBonus => "mobile_bonus",
            ActivityKind::DailyCheckIn => "daily_check_in",
            ActivityKind::ReadArticle => "read_article",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::AppHeartbeat => "app heartbeat",
            ActivityKind::MobileBonus => "mobile bonus",
            ActivityKind::DailyCheckIn => "daily check-in",
            ActivityKind::ReadArticle => "read",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityOutcome {
    /// Points awarded by this call (zero when nothing was granted).
    pub points: i64,
    /// Remote reported the award was already claimed today.
    pub already_claimed: bool,
}

/// Risk signal classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    /// Account suspended; aborts the run even for accounts that ignore soft
    /// risk signals.
    Suspended,
    /// Outright HTTP 403.
    Forbidden,
    /// HTTP 429 or rate-limit markers; soft.
    RateLimited,
    /// Verification-required markers; soft.
    VerificationRequired,
    /// Generic risk marker in the response body; soft.
    Flagged,
}

impl RiskKind {
    /// Suspension is the one signal a run never continues past, even when
    /// the account is configured to ignore soft risk markers.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RiskKind::Suspended)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskKind::Suspended => "suspended",
            RiskKind::Forbidden => "forbidden",
            RiskKind::RateLimited => "rate_limited",
            RiskKind::VerificationRequired => "verification_required",
            RiskKind::Flagged => "flagged",
        }
    }
}

/// Errors surfaced by the remote task API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("risk signal ({}): {message}", .kind.as_str())]
    Risk { kind: RiskKind, message: String },

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn risk_kind(&self) -> Option<RiskKind> {
        match self {
            ApiError::Risk { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Exception text mentioning suspension/risk moves an account to `Risk`
    /// status rather than `Error`.
    pub fn is_risk(&self) -> bool {
        matches!(self, ApiError::Risk { .. })
    }
}

/// Remote task API collaborator: token exchange, dashboard reads, and
/// activity submission. Implemented over HTTP in the infrastructure crate.
#[async_trait]
pub trait RewardsGateway: Send + Sync {
    /// Refresh-grant exchange. Rotates the refresh secret.
    async fn refresh_tokens(&self, refresh_token: &str) -> Result<TokenGrant, ApiError>;

    /// One-time authorization-code exchange used during onboarding only.
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ApiError>;

    async fn fetch_dashboard(&self, access_token: &str) -> Result<DashboardSnapshot, ApiError>;

    async fn report_activity(
        &self,
        access_token: &str,
        kind: ActivityKind,
    ) -> Result<ActivityOutcome, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_risk_kinds() {
        assert!(RiskKind::Suspended.is_fatal());
        assert!(!RiskKind::Forbidden.is_fatal());
        assert!(!RiskKind::RateLimited.is_fatal());
        assert!(!RiskKind::VerificationRequired.is_fatal());
        assert!(!RiskKind::Flagged.is_fatal());
    }

    #[test]
    fn test_api_error_risk_accessors() {
        let err = ApiError::Risk {
            kind: RiskKind::RateLimited,
            message: "429".to_string(),
        };
        assert!(err.is_risk());
        assert_eq!(err.risk_kind(), Some(RiskKind::RateLimited));
        assert!(ApiError::Timeout.risk_kind().is_none());
    }

    #[test]
    fn test_task_progress_complete() {
        assert!(TaskProgress {
            progress: 30,
            max: 30
        }
        .complete());
        assert!(!TaskProgress { progress: 0, max: 0 }.complete());
    }
}
