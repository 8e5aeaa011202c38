//! Hourly cap on automatically applied fixes

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Counts auto-applied fixes in a one-hour window
///
/// The window starts at the first use and restarts once more than an hour
/// has passed since it started; the counter is zeroed at each restart.
/// At exactly [`Self::resets_at`] the old window still holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyRateLimiter {
    max_per_hour: u32,
    applied: u32,
    window_start: DateTime<Utc>,
}

impl HourlyRateLimiter {
    /// Create limiter with its window starting at `now`
    #[must_use]
    pub fn new(max_per_hour: u32, now: DateTime<Utc>) -> Self {
        Self {
            max_per_hour,
            applied: 0,
            window_start: now,
        }
    }

    /// Restart the window if more than an hour has elapsed
    pub fn roll(&mut self, now: DateTime<Utc>) {
        if now - self.window_start > Duration::hours(1) {
            self.window_start = now;
            self.applied = 0;
        }
    }

    /// Whether the cap is reached for the window containing `now`
    pub fn is_exhausted(&mut self, now: DateTime<Utc>) -> bool {
        self.roll(now);
        self.applied >= self.max_per_hour
    }

    /// Count one applied fix
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.roll(now);
        self.applied = self.applied.saturating_add(1);
    }

    /// Fixes applied in the current window
    #[inline]
    #[must_use]
    pub fn applied(&self) -> u32 {
        self.applied
    }

    /// Configured cap
    #[inline]
    #[must_use]
    pub fn max_per_hour(&self) -> u32 {
        self.max_per_hour
    }

    /// When the current window ends
    #[inline]
    #[must_use]
    pub fn resets_at(&self) -> DateTime<Utc> {
        self.window_start + Duration::hours(1)
    }

    /// Change the cap without touching the window
    pub fn set_max(&mut self, max_per_hour: u32) {
        self.max_per_hour = max_per_hour;
    }
}
