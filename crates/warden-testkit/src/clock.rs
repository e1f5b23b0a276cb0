//! Controllable time source

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::RwLock;

use warden_engine::Clock;

/// Clock pinned to an explicit instant, advanced manually by tests
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    /// Clock starting at the given instant
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Clock at a fixed, arbitrary epoch
    pub fn default_epoch() -> Self {
        Self::at(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    /// Move the clock forward
    pub fn advance(&self, delta: Duration) {
        *self.now.write() += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}
