use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::host::HostCallbacks;

/// Failures further apart than this don't count towards the same streak, in ms.
pub const COUNTING_WINDOW_MS: i64 = 5000;

/// Fast consecutive failures needed before the hint shows.
pub const TRIGGER_COUNT: u32 = 5;

pub trait Clock {
    /// Milliseconds from an arbitrary, fixed epoch.
    fn now_ms(&self) -> i64;
}

/// Monotonic wall clock.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        i64::try_from(self.start.elapsed().as_millis()).unwrap_or(i64::MAX)
    }
}

/// A clock that only moves when told to. Used by tests and script replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: i64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: i64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

/// Shows the unlock hint when someone keeps failing the sequence in quick succession.
pub struct TooltipReminder {
    clock: Rc<dyn Clock>,
    frustration: u32,
    last_attempt_ms: Option<i64>,
}

impl TooltipReminder {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            // Primed, so the first failure after startup always shows the hint.
            frustration: TRIGGER_COUNT - 1,
            last_attempt_ms: None,
        }
    }

    pub fn frustration(&self) -> u32 {
        self.frustration
    }

    /// Returns true if the hint was shown.
    pub fn register_failed_attempt(&mut self, host: &dyn HostCallbacks) -> bool {
        let now = self.clock.now_ms();
        let in_window = match self.last_attempt_ms {
            Some(last) => now.saturating_sub(last) < COUNTING_WINDOW_MS,
            None => true,
        };

        self.frustration = if in_window { self.frustration + 1 } else { 0 };
        self.last_attempt_ms = Some(now);

        if self.frustration >= TRIGGER_COUNT {
            log::info!("Unlock failed {TRIGGER_COUNT} times in a row; showing the hint");
            host.show_config_tooltip();
            self.frustration = 0;
            true
        } else {
            false
        }
    }
}
