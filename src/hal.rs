// src/hal.rs

//! # Hardware Collaborator Interfaces
//!
//! Traits describing the motor, solenoid and sensor drivers the controllers
//! talk to. Real drivers live outside this crate; [`crate::sim`] provides
//! simulated versions.

/// Motor output accepting a command in `[-1, 1]`.
pub trait MotorOutput: Send {
    /// Applies a speed command.
    fn set(&mut self, speed: f64);
}

/// Left/right drive outputs with an external safety watchdog.
pub trait DriveOutputs: Send {
    /// Applies left and right side commands, each in `[-1, 1]`.
    fn set_left_right(&mut self, left: f64, right: f64);

    /// Enables or disables the output watchdog. While enabled the driver
    /// zeroes the motors on its own when commands stop arriving.
    fn set_safety_enabled(&mut self, enabled: bool);
}

/// Quadrature encoder.
pub trait Encoder: Send {
    /// Accumulated count in ticks.
    fn get(&self) -> i32;
    /// Zeroes the count.
    fn reset(&mut self);
}

/// Single-axis rate gyro integrated to a heading.
pub trait Gyro: Send {
    /// Heading in degrees.
    fn angle(&self) -> f64;
    /// Zeroes the heading.
    fn reset(&mut self);
    /// Sets the volts-per-degree-per-second sensitivity.
    fn set_sensitivity(&mut self, volts_per_degree_per_second: f64);
    /// Full recalibration. Slow, only valid while the robot is stationary.
    fn reinit(&mut self);
}

/// Ultrasonic range sensor.
pub trait RangeFinder: Send {
    /// Distance to the nearest object in inches.
    fn range_inches(&self) -> f64;
}

/// Digital input such as a limit switch.
pub trait DigitalInput: Send {
    /// Raw state of the input.
    fn get(&self) -> bool;
}

/// Analog potentiometer.
pub trait Potentiometer: Send {
    /// Oversampled, averaged voltage.
    fn average_voltage(&self) -> f64;
}

/// Single-acting solenoid.
pub trait Solenoid: Send {
    /// Energizes or releases the solenoid.
    fn set(&mut self, on: bool);
}

/// Position of a double-acting solenoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolenoidDirection {
    /// Neither coil energized.
    #[default]
    Off,
    /// Forward coil energized.
    Forward,
    /// Reverse coil energized.
    Reverse,
}

/// Double-acting solenoid.
pub trait DoubleSolenoid: Send {
    /// Drives the solenoid.
    fn set(&mut self, direction: SolenoidDirection);
    /// Last commanded direction.
    fn get(&self) -> SolenoidDirection;
}

/// Externally computed hot-goal signal from the vision system.
pub trait VisionSignal: Send {
    /// Whether the goal in view is currently hot.
    fn goal_is_hot(&self) -> bool;
    /// Asks the vision system to compute, or stop computing, the signal.
    fn set_enabled(&mut self, enabled: bool);
}

/// Telemetry sink fed once per publish by each subsystem.
pub trait Dashboard {
    /// Publishes a number.
    fn put_number(&mut self, key: &str, value: f64);
    /// Publishes a flag.
    fn put_bool(&mut self, key: &str, value: bool);
}

/// Last-known-good filter for sensor readings.
///
/// Non-finite readings are replaced with the previous finite one so a
/// glitching sensor never feeds NaN into a control loop.
#[derive(Debug, Clone, Copy)]
pub struct LastGood {
    name: &'static str,
    value: f64,
}

impl LastGood {
    /// Creates a filter whose fallback starts at zero.
    pub const fn new(name: &'static str) -> Self {
        LastGood { name, value: 0.0 }
    }

    /// Passes finite readings through and remembers them.
    pub fn filter(&mut self, raw: f64) -> f64 {
        if raw.is_finite() {
            self.value = raw;
        } else {
            log::warn!(
                "implausible {} reading {}, holding {}",
                self.name,
                raw,
                self.value
            );
        }
        self.value
    }

    /// Most recent accepted reading.
    pub fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    /// Test that non-finite readings hold the last good value.
    #[test]
    fn test_hal_last_good_holds_on_garbage() {
        let mut filter = LastGood::new("gyro");
        assert!(value_close(12.5, filter.filter(12.5)));
        assert!(value_close(12.5, filter.filter(f64::NAN)));
        assert!(value_close(12.5, filter.filter(f64::INFINITY)));
        assert!(value_close(-3.0, filter.filter(-3.0)));
        assert!(value_close(-3.0, filter.value()));
    }
}
