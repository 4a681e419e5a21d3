// src/autonomous/deadline.rs

//! # Bounded Waits
//!
//! A [`Deadline`] pairs a sensor condition with a time budget so that every
//! wait in an autonomous routine has a guaranteed exit.

use crate::timer::{SharedClock, Timer};
use std::time::Duration;

/// Result of polling a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Neither the condition nor the budget has been reached.
    Pending,
    /// The condition held before the budget ran out.
    Satisfied,
    /// The budget ran out first.
    TimedOut,
}

impl WaitOutcome {
    /// `true` once the wait is over either way.
    pub fn is_done(self) -> bool {
        self != WaitOutcome::Pending
    }
}

/// Restartable time budget shared by the states of one routine.
#[derive(Debug, Clone)]
pub struct Deadline {
    timer: Timer,
}

impl Deadline {
    /// Creates an already expired deadline.
    pub fn new(clock: SharedClock) -> Self {
        Deadline {
            timer: Timer::new(clock),
        }
    }

    /// Restarts the budget.
    pub fn within(&mut self, budget: Duration) {
        self.timer.set_expiration(budget);
    }

    /// Restarts the budget in milliseconds.
    pub fn within_ms(&mut self, budget_ms: f64) {
        self.timer.set_expiration_ms(budget_ms);
    }

    /// Polls the wait: the condition wins ties with the budget.
    pub fn until(&self, condition: bool) -> WaitOutcome {
        if condition {
            WaitOutcome::Satisfied
        } else if self.timer.has_expired() {
            WaitOutcome::TimedOut
        } else {
            WaitOutcome::Pending
        }
    }

    /// Whether the budget has run out.
    pub fn expired(&self) -> bool {
        self.timer.has_expired()
    }

    /// Milliseconds since the budget was last restarted.
    pub fn elapsed_ms(&self) -> f64 {
        self.timer.elapsed_ms()
    }
}
