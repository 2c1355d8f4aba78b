//! Removal of programmes that started longer ago than a retention window.
//!
//! The sweeper does not schedule itself; callers run it on their own timer
//! (typically once a day).

use chrono::{NaiveDateTime, TimeDelta, Utc};

use crate::store::EpgStore;

/// Retention window used by [`StaleProgrammeSweeper::default`].
pub const DEFAULT_RETENTION_DAYS: u32 = 3;

/// Purges programmes whose start is older than the retention window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleProgrammeSweeper {
    retention_days: u32,
}

impl Default for StaleProgrammeSweeper {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_DAYS)
    }
}

impl StaleProgrammeSweeper {
    /// Creates a sweeper keeping `retention_days` of history.
    #[must_use]
    pub const fn new(retention_days: u32) -> Self {
        Self { retention_days }
    }

    /// Retention window in days.
    #[must_use]
    pub const fn retention_days(&self) -> u32 {
        self.retention_days
    }

    /// Oldest start time that survives a sweep run at `now`.
    #[must_use]
    pub fn threshold(&self, now: NaiveDateTime) -> NaiveDateTime {
        TimeDelta::try_days(i64::from(self.retention_days))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// Sweeps relative to the current UTC time. Returns the number of
    /// programmes removed.
    pub fn sweep(&self, store: &mut EpgStore) -> usize {
        self.sweep_at(store, Utc::now().naive_utc())
    }

    /// Sweeps relative to `now` (UTC wall-clock).
    ///
    /// A programme is removed when its start wall-clock time, ignoring its
    /// offset, is strictly earlier than `now - retention`.
    pub fn sweep_at(&self, store: &mut EpgStore, now: NaiveDateTime) -> usize {
        let threshold = self.threshold(now);
        let removed = store.retain_programmes(|p| p.start.local() >= threshold);

        tracing::info!(
            removed,
            retention_days = self.retention_days,
            threshold = %threshold,
            "stale programmes swept"
        );
        removed
    }
}
