//! Time source for the session.

use std::thread;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};

/// Monotonic time, wall-clock time and sleeping.
pub trait Clock {
    /// Monotonic time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Local wall-clock time, used to stamp log rows and file names.
    fn wall_time(&self) -> NaiveDateTime;

    /// Block the calling thread.
    fn sleep(&self, duration: Duration);
}

/// The real clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall_time(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        clock.sleep(Duration::from_millis(2));
        assert!(clock.now() >= a + Duration::from_millis(2));
    }
}
