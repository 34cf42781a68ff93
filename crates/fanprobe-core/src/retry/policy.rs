use std::time::Duration;

/// Decision returned by the repeat policy after a full pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatDecision {
    /// The pass had no errors.
    Done,
    /// Errors remain but the repeat budget is spent.
    Exhausted,
    /// Run another pass after the given delay.
    RetryAfter(Duration),
}

/// How many passes to run and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatPolicy {
    /// Repeats allowed after the first pass; `None` repeats until the deadline.
    pub max_repeat: Option<u32>,
    pub delay: Duration,
}

impl RepeatPolicy {
    /// `max_repeat < 0` means unbounded.
    pub fn new(max_repeat: i32, delay: Duration) -> Self {
        Self {
            max_repeat: u32::try_from(max_repeat).ok(),
            delay,
        }
    }

    /// `iteration` is 1-based (1 = first pass). Warnings never trigger a repeat.
    pub fn decide(&self, iteration: u32, pass_errors: usize) -> RepeatDecision {
        if pass_errors == 0 {
            return RepeatDecision::Done;
        }
        match self.max_repeat {
            Some(max) if iteration > max => RepeatDecision::Exhausted,
            _ => RepeatDecision::RetryAfter(self.delay),
        }
    }
}
