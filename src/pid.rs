// src/pid.rs

//! # PID Control Module
//!
//! This module provides the compute function and the stateful iterative
//! controller used by every closed-loop primitive on the robot.

use piddiy::Number as PiddiyNumber;

pub mod iterative;
pub use iterative::*;

/// Custom trait to encapsulate base number requirements.
pub trait Number: PiddiyNumber {
    /// Clamps generic PartialOrd values within a given range.
    fn clamp(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if max < self {
            max
        } else {
            self
        }
    }
}

impl<T: PiddiyNumber> Number for T {}

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains<T> {
    /// Proportional gain.
    pub kp: T,
    /// Integral gain.
    pub ki: T,
    /// Derivative gain.
    pub kd: T,
}

impl<T> PidGains<T> {
    /// Creates a gain set.
    pub const fn new(kp: T, ki: T, kd: T) -> Self {
        PidGains { kp, ki, kd }
    }
}
