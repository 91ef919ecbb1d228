/// Debounced single-shot trigger for autosave.
///
/// The host event loop owns the clock: `trigger` re-arms the deadline and
/// `poll` reports whether it has passed. Rapid triggers collapse into a
/// single fire `delay` after the most recent one.
use std::time::{Duration, Instant};

/// Autosave delay used when nothing else is configured.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_DELAY)
    }
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)arm the timer; any pending deadline is replaced.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// True exactly once per armed deadline, when `now` has reached it.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}
