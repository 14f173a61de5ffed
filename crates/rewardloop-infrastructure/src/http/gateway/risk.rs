use reqwest::StatusCode;

use rewardloop_domain::gateway::RiskKind;

/// HTTP 403 is an outright block; 429 is a soft rate-limit signal.
pub(super) fn classify_status(status: StatusCode) -> Option<RiskKind> {
    match status {
        StatusCode::FORBIDDEN => Some(RiskKind::Forbidden),
        StatusCode::TOO_MANY_REQUESTS => Some(RiskKind::RateLimited),
        _ => None,
    }
}

/// Body markers the remote uses for suspension, verification walls, and
/// generic risk flags. Checked most-severe first.
pub(super) fn classify_body(body: &str) -> Option<RiskKind> {
    let lower = body.to_lowercase();
    if lower.contains("suspended") || lower.contains("suspension") {
        Some(RiskKind::Suspended)
    } else if lower.contains("verification") || lower.contains("verify your account") {
        Some(RiskKind::VerificationRequired)
    } else if lower.contains("too many requests") || lower.contains("rate limit") {
        Some(RiskKind::RateLimited)
    } else if lower.contains("\"risk\"") || lower.contains("risk_control") {
        Some(RiskKind::Flagged)
    } else {
        None
    }
}

/// Bounded body excerpt for error messages and logs.
pub(super) fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let mut end = MAX;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &trimmed[..end])
    }
}
