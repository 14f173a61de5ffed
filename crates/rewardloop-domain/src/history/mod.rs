use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One recorded point reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointHistoryItem {
    pub at: DateTime<Utc>,
    pub points: i64,
}

impl PointHistoryItem {
    pub fn new(at: DateTime<Utc>, points: i64) -> Self {
        Self { at, points }
    }

    pub fn day(&self) -> NaiveDate {
        self.at.date_naive()
    }
}

/// What `PointHistory::record` did with a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// New entry appended.
    Appended,
    /// Same day, same value: nothing written.
    Coalesced,
    /// Within the overwrite window of the previous entry: replaced in place.
    Overwrote,
}

/// Ordered-by-time point history, bounded to the most recent entries.
///
/// Two rules keep the history quiet under rapid consecutive calls:
/// - recording the same value twice on the same calendar day is a no-op;
/// - a different value arriving within 60 seconds of the previous entry
///   overwrites it instead of appending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointHistory {
    items: Vec<PointHistoryItem>,
}

impl PointHistory {
    pub const CAPACITY: usize = 200;
    pub const OVERWRITE_WINDOW_SECS: i64 = 60;

    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn restore(items: Vec<PointHistoryItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[PointHistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn latest(&self) -> Option<&PointHistoryItem> {
        self.items.last()
    }

    /// Latest reading recorded strictly before the given calendar day.
    pub fn latest_before_day(&self, day: NaiveDate) -> Option<&PointHistoryItem> {
        self.items.iter().rev().find(|item| item.day() < day)
    }

    pub fn record(&mut self, points: i64, now: DateTime<Utc>) -> RecordOutcome {
        if let Some(last) = self.items.last_mut() {
            if last.day() == now.date_naive() && last.points == points {
                return RecordOutcome::Coalesced;
            }
            let elapsed = now.signed_duration_since(last.at).num_seconds();
            if (0..=Self::OVERWRITE_WINDOW_SECS).contains(&elapsed) {
                last.at = now;
                last.points = points;
                return RecordOutcome::Overwrote;
            }
        }

        self.items.push(PointHistoryItem::new(now, points));
        while self.items.len() > Self::CAPACITY {
            self.items.remove(0);
        }
        RecordOutcome::Appended
    }
}

/// One aggregated calendar day, used for trend charts and reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayGroup {
    /// Calendar day (UTC).
    pub date: NaiveDate,
    /// Final point value recorded that day (carried forward for gap days).
    pub points: i64,
    /// Signed delta versus the prior known day; zero for gap days.
    pub delta: i64,
    /// Raw entries recorded that day; empty for gap days.
    pub entries: Vec<PointHistoryItem>,
    /// True when this day was synthesized to keep the time axis continuous.
    pub is_gap: bool,
}

impl DayGroup {
    pub fn year_month(&self) -> (i32, u32) {
        (self.date.year(), self.date.month())
    }
}
