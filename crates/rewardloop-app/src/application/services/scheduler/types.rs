/// Heartbeat cadence. Entries are evaluated against minute windows, so the
/// heartbeat must run at least once per minute.
pub(super) const HEARTBEAT_SECS: u64 = 60;

/// What one heartbeat evaluation dispatched.
#[derive(Debug, Default)]
pub(super) struct TickSummary {
    pub batch_dispatched: bool,
    pub account_runs: usize,
    pub backups: usize,
    pub syncs: usize,
    pub config_errors: usize,
}

impl TickSummary {
    pub fn dispatched_anything(&self) -> bool {
        self.batch_dispatched || self.account_runs > 0 || self.backups > 0 || self.syncs > 0
    }
}
