// src/task/clock.rs

//! Time source and delay primitive for the workload task.

use std::{
    sync::atomic::{AtomicU64, Ordering},
    thread,
    time::{Duration, Instant},
};

pub trait Clock {
    /// Monotonic time since the clock's origin.
    fn now(&self) -> Duration;

    /// Suspend the calling task for `period`.
    fn delay(&self, period: Duration);
}

/// Wall-clock implementation: `Instant` for time, `thread::sleep` for delay.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
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

    fn delay(&self, period: Duration) {
        thread::sleep(period);
    }
}

/// Virtual clock: `delay` advances time instantly. Microsecond resolution.
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let step = u64::try_from(by.as_micros()).unwrap_or(u64::MAX);
        self.micros.fetch_add(step, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }

    fn delay(&self, period: Duration) {
        self.advance(period);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_on_delay() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
        clock.delay(Duration::from_secs(10));
        clock.delay(Duration::from_millis(500));
        assert_eq!(clock.now(), Duration::from_millis(10_500));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        clock.delay(Duration::from_millis(2));
        assert!(clock.now() >= a + Duration::from_millis(2));
    }
}
