use chrono::Duration;
use std::collections::BTreeMap;

use rewardloop_domain::history::{DayGroup, PointHistoryItem};

/// Runaway guard: never synthesize more than this many gap days, however
/// broken the input timestamps are.
pub const GAP_FILL_CAP: usize = 2000;

/// Aggregate a point history into calendar-day groups, most recent first.
///
/// Each group carries the day's final point value and the signed delta
/// versus the prior *known* day (not necessarily the prior calendar day).
/// Days between the first and last recorded day with no entries are
/// synthesized as zero-delta gap groups carrying the last known value
/// forward, so charts render a continuous time axis.
pub fn aggregate_by_day(history: &[PointHistoryItem]) -> Vec<DayGroup> {
    if history.is_empty() {
        return Vec::new();
    }

    let mut by_day: BTreeMap<chrono::NaiveDate, Vec<PointHistoryItem>> = BTreeMap::new();
    for item in history {
        by_day.entry(item.day()).or_default().push(item.clone());
    }

    let mut groups: Vec<DayGroup> = Vec::new();
    let mut prev_points: Option<i64> = None;
    let mut prev_day: Option<chrono::NaiveDate> = None;
    let mut synthesized = 0usize;

    for (day, entries) in by_day {
        // Fill the calendar gap since the previous known day.
        if let (Some(prev_day), Some(prev_points)) = (prev_day, prev_points) {
            let mut cursor = prev_day + Duration::days(1);
            while cursor < day && synthesized < GAP_FILL_CAP {
                groups.push(DayGroup {
                    date: cursor,
                    points: prev_points,
                    delta: 0,
                    entries: Vec::new(),
                    is_gap: true,
                });
                synthesized += 1;
                cursor = cursor + Duration::days(1);
            }
        }

        // The day's final value is its last reading; entries are ordered.
        let points = entries.last().map(|e| e.points).unwrap_or_default();
        let delta = prev_points.map(|prev| points - prev).unwrap_or(0);
        groups.push(DayGroup {
            date: day,
            points,
            delta,
            entries,
            is_gap: false,
        });

        prev_points = Some(points);
        prev_day = Some(day);
    }

    groups.reverse();
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDateTime, Utc};

    fn item(s: &str, points: i64) -> PointHistoryItem {
        let at: DateTime<Utc> = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc();
        PointHistoryItem::new(at, points)
    }

    #[test]
    fn test_empty_history() {
        assert!(aggregate_by_day(&[]).is_empty());
    }

    #[test]
    fn test_day_final_value_and_delta_vs_prior_known_day() {
        let history = vec![
            item("2026-03-01 08:00:00", 100),
            item("2026-03-01 20:00:00", 130),
            item("2026-03-04 09:00:00", 160),
        ];
        let groups = aggregate_by_day(&history);

        // Most recent first: 04, 03(gap), 02(gap), 01.
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0].date.to_string(), "2026-03-04");
        assert_eq!(groups[0].points, 160);
        // Delta against March 1st, the prior known day.
        assert_eq!(groups[0].delta, 30);
        assert_eq!(groups[0].entries.len(), 1);

        assert_eq!(groups[3].date.to_string(), "2026-03-01");
        assert_eq!(groups[3].points, 130);
        assert_eq!(groups[3].delta, 0);
        assert_eq!(groups[3].entries.len(), 2);
    }

    #[test]
    fn test_gap_days_carry_value_forward() {
        let history = vec![
            item("2026-03-01 08:00:00", 100),
            item("2026-03-04 09:00:00", 160),
        ];
        let groups = aggregate_by_day(&history);

        let gap_days: Vec<&DayGroup> = groups.iter().filter(|g| g.is_gap).collect();
        assert_eq!(gap_days.len(), 2);
        for gap in gap_days {
            assert_eq!(gap.points, 100);
            assert_eq!(gap.delta, 0);
            assert!(gap.entries.is_empty());
        }
    }

    #[test]
    fn test_output_is_contiguous() {
        let history = vec![
            item("2026-02-25 08:00:00", 50),
            item("2026-03-01 08:00:00", 100),
            item("2026-03-07 09:00:00", 160),
        ];
        let groups = aggregate_by_day(&history);
        for pair in groups.windows(2) {
            assert_eq!(pair[1].date + Duration::days(1), pair[0].date);
        }
    }

    #[test]
    fn test_negative_delta_preserved() {
        // Points normally never decrease, but a remote correction must show
        // up as a signed delta rather than being clamped.
        let history = vec![
            item("2026-03-01 08:00:00", 100),
            item("2026-03-02 08:00:00", 80),
        ];
        let groups = aggregate_by_day(&history);
        assert_eq!(groups[0].delta, -20);
    }

    #[test]
    fn test_gap_fill_cap() {
        let history = vec![
            item("2000-01-01 08:00:00", 1),
            item("2026-03-01 08:00:00", 2),
        ];
        let groups = aggregate_by_day(&history);
        let synthesized = groups.iter().filter(|g| g.is_gap).count();
        assert_eq!(synthesized, GAP_FILL_CAP);
        // Both real days survive the cap.
        assert_eq!(groups.iter().filter(|g| !g.is_gap).count(), 2);
    }
}
