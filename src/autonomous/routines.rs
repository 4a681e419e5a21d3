// src/autonomous/routines.rs

//! # Explicit State Machine Routines
//!
//! Each routine keeps one state enum and one [`Deadline`](super::Deadline)
//! shared by all of its states. A state either acts and moves on in the same
//! tick, or waits on a sensor under a budget restarted on entry.

use std::fmt::Debug;

mod basic;
mod high_goal;
mod low_goal;
mod stationary;
mod two_ball;

pub use basic::*;
pub use high_goal::*;
pub use low_goal::*;
pub use stationary::*;
pub use two_ball::*;

/// Budget for the post-shot reload, in milliseconds.
pub const RELOAD_TIMEOUT_MS: f64 = 4000.0;

fn transition<S: Debug + Copy>(routine: &str, state: &mut S, next: S) {
    log::debug!("{}: {:?} -> {:?}", routine, *state, next);
    *state = next;
}
