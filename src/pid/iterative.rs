// src/pid/iterative.rs

//! # Iterative PID Control Module
//!
//! This module provides a compute function and a call-driven PID controller.
//! Each call to [`IterativePid::run`] produces one output sample using the
//! time elapsed since the previous call, so the controller keeps working when
//! the control loop period jitters.

use crate::pid::{Number, PidGains};
use crate::timer::{SharedClock, Timer};
use piddiy::PidController;
use std::fmt;

/// Control data for the iterative PID compute callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IterativeControlData<T> {
    /// The process variable, the value currently measured.
    pub measurement: T,
    /// The time delta since the last computation.
    pub dt: T,
}

/// Iterative PID compute callback.
///
/// A zero `dt` yields a zero derivative instead of a division fault.
pub fn compute_iterative<T: Number>(
    pid: &mut PidController<T, IterativeControlData<T>>,
    data: IterativeControlData<T>,
) -> (T, T, T) {
    let error = pid.set_point - data.measurement;
    let integral = pid.integral + error * data.dt;
    let derivative = if data.dt == T::zero() {
        T::zero()
    } else {
        (error - pid.error) / data.dt
    };

    (error, integral, derivative)
}

/// Stateful PID controller driven once per control tick.
///
/// The integral and previous error only advance inside [`IterativePid::run`].
/// Callers must [`reset`](IterativePid::reset) before handing an actuator
/// back to closed-loop control after open-loop driving, otherwise the stale
/// integral produces an output spike.
pub struct IterativePid {
    pid: PidController<f64, IterativeControlData<f64>>,
    delta_timer: Timer,
}

impl IterativePid {
    /// Default lower output bound.
    pub const DEFAULT_MIN: f64 = -1.0;
    /// Default upper output bound.
    pub const DEFAULT_MAX: f64 = 1.0;

    /// Creates a reset controller with the given gains.
    pub fn new(gains: PidGains<f64>, clock: SharedClock) -> Self {
        let mut pid = PidController::new();
        pid.compute_fn(compute_iterative)
            .kp(gains.kp)
            .ki(gains.ki)
            .kd(gains.kd);

        let mut controller = IterativePid {
            pid,
            delta_timer: Timer::new(clock),
        };
        controller.reset();
        controller
    }

    /// Replaces the gains in place. Integral and error history are kept so
    /// live tuning does not disturb an active loop.
    pub fn set_pid(&mut self, gains: PidGains<f64>) {
        self.pid.kp(gains.kp).ki(gains.ki).kd(gains.kd);
    }

    /// The active gains.
    pub fn gains(&self) -> PidGains<f64> {
        PidGains::new(self.pid.kp, self.pid.ki, self.pid.kd)
    }

    /// Zeroes the integral and previous error and re-anchors the delta timer.
    pub fn reset(&mut self) {
        self.pid.integral = 0.0;
        self.pid.error = 0.0;
        self.delta_timer.reset();
    }

    /// Runs one iteration with the default `[-1, 1]` output range.
    pub fn run(&mut self, set_point: f64, measured: f64) -> f64 {
        self.run_clamped(set_point, measured, Self::DEFAULT_MIN, Self::DEFAULT_MAX)
    }

    /// Runs one iteration and clamps the output to `[min, max]`.
    ///
    /// `dt` is the number of milliseconds since the previous run or reset.
    pub fn run_clamped(&mut self, set_point: f64, measured: f64, min: f64, max: f64) -> f64 {
        let data = IterativeControlData {
            measurement: measured,
            dt: self.delta_timer.elapsed_ms(),
        };
        self.pid.set_point(set_point);
        let output = self.pid.compute(data);
        self.delta_timer.reset();

        if output.is_nan() {
            return Number::clamp(0.0, min, max);
        }
        Number::clamp(output, min, max)
    }

    /// Accumulated integral term.
    pub fn integral(&self) -> f64 {
        self.pid.integral
    }

    /// Error seen on the previous run.
    pub fn previous_error(&self) -> f64 {
        self.pid.error
    }
}

impl fmt::Debug for IterativePid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterativePid")
            .field("gains", &self.gains())
            .field("integral", &self.pid.integral)
            .field("previous_error", &self.pid.error)
            .finish()
    }
}
