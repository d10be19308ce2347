//! Time source for the simulated monitor.
//!
//! Readings are generated from elapsed time, so tests swap in `TestClock`
//! and step time forward instead of waiting.
use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&self) -> Instant;
    /// Block for `d`; simulated clocks just move forward.
    fn sleep(&self, d: Duration);
}

/// Wall-clock time via `Instant::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use super::Clock;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    /// Manually stepped clock; clones share one timeline.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        start: Instant,
        elapsed: Arc<Mutex<Duration>>,
    }

    impl Default for TestClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestClock {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
                elapsed: Arc::default(),
            }
        }

        pub fn advance(&self, d: Duration) {
            if let Ok(mut e) = self.elapsed.lock() {
                *e += d;
            }
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Instant {
            let e = self.elapsed.lock().map_or(Duration::ZERO, |g| *g);
            self.start + e
        }

        fn sleep(&self, d: Duration) {
            self.advance(d);
        }
    }

}
