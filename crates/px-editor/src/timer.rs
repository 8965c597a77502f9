//! Cancellable debounce timers driven by host-supplied timestamps.
//!
//! The engine never reads a clock. Callers pass the current time in
//! milliseconds; a timer fires on the first poll at or past its deadline.

/// Milliseconds on the host's monotonic clock.
pub type Millis = u64;

#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay: Millis,
    deadline: Option<Millis>,
}

impl DebounceTimer {
    pub fn new(delay: Millis) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// (Re)start the quiet period from `now`.
    pub fn schedule(&mut self, now: Millis) {
        self.deadline = Some(now.saturating_add(self.delay));
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.deadline
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Millis) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
