// src/pickup.rs

//! # Pickup Subsystem
//!
//! Deployable roller intake. Negative roller speeds pull a ball in, positive
//! speeds push it out.

use crate::hal::{Dashboard, DigitalInput, DoubleSolenoid, MotorOutput, SolenoidDirection};

/// Roller speed that pulls a ball in.
pub const ROLLER_INTAKE: f64 = -1.0;

/// Roller speed that pushes a ball out.
pub const ROLLER_EJECT: f64 = 1.0;

/// Hardware owned by the pickup.
pub struct PickupIo {
    /// Roller motor.
    pub roller: Box<dyn MotorOutput>,
    /// Deploy solenoid, forward lowers the pickup.
    pub deploy: Box<dyn DoubleSolenoid>,
    /// Switch that reads low while the pickup is lowered.
    pub lowered_switch: Box<dyn DigitalInput>,
}

/// Pickup subsystem.
pub struct Pickup {
    io: PickupIo,
}

impl Pickup {
    /// Wraps the pickup hardware.
    pub fn new(io: PickupIo) -> Self {
        Pickup { io }
    }

    /// Moves the pickup to the raised position.
    pub fn raise(&mut self) {
        self.io.deploy.set(SolenoidDirection::Reverse);
    }

    /// Moves the pickup to the lowered position.
    pub fn lower(&mut self) {
        self.io.deploy.set(SolenoidDirection::Forward);
    }

    /// Sets the roller speed.
    pub fn set_roller_speed(&mut self, speed: f64) {
        self.io.roller.set(speed.clamp(-1.0, 1.0));
    }

    /// Stops the roller.
    pub fn stop_rollers(&mut self) {
        self.io.roller.set(0.0);
    }

    /// Whether the pickup is lowered.
    pub fn is_lowered(&self) -> bool {
        !self.io.lowered_switch.get()
    }

    /// Publishes pickup state.
    pub fn update_dashboard(&self, dashboard: &mut dyn Dashboard) {
        dashboard.put_bool("Pickup Lowered", self.is_lowered());
    }
}
