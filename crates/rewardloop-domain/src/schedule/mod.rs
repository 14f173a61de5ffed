use chrono::{DateTime, Duration, Timelike, Utc};
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::shared::DomainError;

/// Normalize a five-field cron expression for the evaluator, which also
/// accepts an optional seconds field. `"30 8 * * *"` becomes `"0 30 8 * * *"`.
pub fn normalize_expression(expression: &str) -> Result<String, DomainError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidCron("expression is empty".to_string()));
    }
    let fields = trimmed.split_whitespace().count();
    if fields == 5 {
        Ok(format!("0 {trimmed}"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_schedule(expression: &str) -> Result<Schedule, DomainError> {
    let normalized = normalize_expression(expression)?;
    Schedule::from_str(&normalized)
        .map_err(|e| DomainError::InvalidCron(format!("{expression}: {e}")))
}

/// Validate without keeping the parsed schedule around.
pub fn validate_expression(expression: &str) -> Result<(), DomainError> {
    parse_schedule(expression).map(|_| ())
}

fn minute_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// A schedule with a time pattern, enabled flag, and last-fired timestamp.
///
/// The scheduler owns evaluation; whoever owns the entry (an account or the
/// global config) owns persistence of `last_run_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    cron_expression: String,
    enabled: bool,
    last_run_at: Option<DateTime<Utc>>,
}

impl ScheduleEntry {
    pub fn new(cron_expression: impl Into<String>, enabled: bool) -> Result<Self, DomainError> {
        let cron_expression = cron_expression.into();
        validate_expression(&cron_expression)?;
        Ok(Self {
            cron_expression,
            enabled,
            last_run_at: None,
        })
    }

    pub fn restore(
        cron_expression: String,
        enabled: bool,
        last_run_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            cron_expression,
            enabled,
            last_run_at,
        }
    }

    pub fn expression(&self) -> &str {
        &self.cron_expression
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_run_at(&self) -> Option<DateTime<Utc>> {
        self.last_run_at
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_expression(&mut self, expression: impl Into<String>) -> Result<(), DomainError> {
        let expression = expression.into();
        validate_expression(&expression)?;
        self.cron_expression = expression;
        Ok(())
    }

    /// Next run strictly after `now`.
    pub fn next_run_after(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, DomainError> {
        let schedule = parse_schedule(&self.cron_expression)?;
        Ok(schedule.after(&now).next())
    }

    /// Due iff the next run computed from the start of the current minute
    /// falls inside that minute, and the entry has not already fired in it.
    /// An unparsable expression is a configuration error: the caller logs it
    /// and the entry stays perpetually not-due.
    pub fn is_due(&self, now: DateTime<Utc>) -> Result<bool, DomainError> {
        if !self.enabled {
            return Ok(false);
        }
        let window_start = minute_start(now);
        if let Some(last) = self.last_run_at {
            if last >= window_start {
                return Ok(false);
            }
        }
        let schedule = parse_schedule(&self.cron_expression)?;
        let next = schedule
            .after(&(window_start - Duration::seconds(1)))
            .next();
        Ok(matches!(next, Some(next) if next < window_start + Duration::seconds(60)))
    }

    /// Advance past the current window. Called before dispatch so a slow
    /// action cannot double-fire.
    pub fn mark_fired(&mut self, now: DateTime<Utc>) {
        self.last_run_at = Some(now);
    }

    /// Manual escape hatch: the entry may fire again on the very next
    /// heartbeat if the current time still matches its pattern.
    pub fn reset_last_run(&mut self) {
        self.last_run_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_normalize_five_field() {
        assert_eq!(normalize_expression("30 8 * * *").unwrap(), "0 30 8 * * *");
        assert_eq!(
            normalize_expression("0 30 8 * * *").unwrap(),
            "0 30 8 * * *"
        );
        assert!(normalize_expression("  ").is_err());
    }

    #[test]
    fn test_invalid_expression_is_config_error() {
        let entry = ScheduleEntry::restore("not a cron".to_string(), true, None);
        assert!(matches!(
            entry.is_due(ts("2026-03-01 08:30:15")),
            Err(DomainError::InvalidCron(_))
        ));
        assert!(ScheduleEntry::new("nope", true).is_err());
    }

    #[test]
    fn test_due_within_matching_minute() {
        let entry = ScheduleEntry::new("30 8 * * *", true).unwrap();
        assert!(entry.is_due(ts("2026-03-01 08:30:00")).unwrap());
        assert!(entry.is_due(ts("2026-03-01 08:30:42")).unwrap());
        assert!(!entry.is_due(ts("2026-03-01 08:31:00")).unwrap());
        assert!(!entry.is_due(ts("2026-03-01 08:29:59")).unwrap());
    }

    #[test]
    fn test_disabled_never_due() {
        let entry = ScheduleEntry::new("30 8 * * *", false).unwrap();
        assert!(!entry.is_due(ts("2026-03-01 08:30:00")).unwrap());
    }

    #[test]
    fn test_no_double_fire_within_one_minute() {
        let mut entry = ScheduleEntry::new("*/5 * * * *", true).unwrap();
        let first = ts("2026-03-01 08:05:10");
        assert!(entry.is_due(first).unwrap());
        entry.mark_fired(first);

        // Later heartbeat inside the same minute must not fire again.
        assert!(!entry.is_due(ts("2026-03-01 08:05:55")).unwrap());
        // The next matching window fires normally.
        assert!(entry.is_due(ts("2026-03-01 08:10:02")).unwrap());
    }

    #[test]
    fn test_reset_last_run_refires_in_same_minute() {
        let mut entry = ScheduleEntry::new("*/5 * * * *", true).unwrap();
        let now = ts("2026-03-01 08:05:10");
        entry.mark_fired(now);
        assert!(!entry.is_due(ts("2026-03-01 08:05:40")).unwrap());

        entry.reset_last_run();
        assert!(entry.is_due(ts("2026-03-01 08:05:40")).unwrap());
    }

    #[test]
    fn test_next_run_after() {
        let entry = ScheduleEntry::new("0 9 * * *", true).unwrap();
        let next = entry
            .next_run_after(ts("2026-03-01 10:00:00"))
            .unwrap()
            .unwrap();
        assert_eq!(next, ts("2026-03-02 09:00:00"));
    }
}
