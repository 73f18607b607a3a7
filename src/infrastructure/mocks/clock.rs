//! Mock clock for testing.

use crate::application::ports::Clock;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// Mock clock for testing.
///
/// Allows tests to control time explicitly, so expiry markers and event
/// timestamps are deterministic.
///
/// # Examples
///
/// ```
/// use tracing_ttl::infrastructure::mocks::MockClock;
/// use tracing_ttl::application::ports::Clock;
/// use chrono::{TimeZone, Utc};
/// use std::time::Duration;
///
/// let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
/// let clock = MockClock::new(start);
/// assert_eq!(clock.now(), start);
///
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now(), start + chrono::Duration::seconds(10));
/// ```
///
/// All clones share the same underlying time, so advancing one clone
/// advances them all.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a mock clock starting at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Advance the clock by a duration.
    ///
    /// # Panics
    /// If `duration` does not fit a `chrono::Duration`.
    pub fn advance(&self, duration: std::time::Duration) {
        let step = chrono::Duration::from_std(duration).expect("MockClock step out of range");
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time += step;
    }

    /// Set the clock to a specific time.
    pub fn set(&self, time: DateTime<Utc>) {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock") = time;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_mock_clock() {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let clock = MockClock::new(start);
        let shared = clock.clone();

        shared.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), start + chrono::Duration::seconds(90));

        let later = start + chrono::Duration::days(7);
        clock.set(later);
        assert_eq!(shared.now(), later);
    }
}
