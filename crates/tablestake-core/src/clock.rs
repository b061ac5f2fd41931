use std::cell::Cell;

/// Source of "now" in unix seconds.
pub trait Clock {
    /// Current time, unix seconds.
    fn now(&self) -> i64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Manually driven clock for tests and replayable command runs.
#[derive(Debug, Clone, Default)]
pub struct FixedClock {
    now: Cell<i64>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    pub fn at(now: i64) -> Self {
        Self { now: Cell::new(now) }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: i64) {
        self.now.set(now);
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.now.get()
    }
}
