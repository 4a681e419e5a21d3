// src/autonomous.rs

//! # Autonomous Sequencing
//!
//! Scripted match-opening routines built on the drivetrain, shooter and
//! pickup. Two forms are provided:
//!
//! - [`CommandSequence`]: an ordered queue of [`AutonomousCommand`]s, each run
//!   through `init`, `run`, `is_finished` and `end`.
//! - Explicit state machines in [`routines`]: a state enum advanced once per
//!   tick, where every wait is bounded by a [`Deadline`].
//!
//! Both implement [`AutonomousMode`] and are picked with [`select_mode`].

use crate::drivetrain::Drivetrain;
use crate::hal::VisionSignal;
use crate::params::{Param, ParameterStore};
use crate::pickup::{Pickup, ROLLER_INTAKE};
use crate::shooter::Shooter;
use crate::timer::SharedClock;
use std::fmt;

pub mod commands;
pub mod deadline;
pub mod routines;
pub mod sequence;

pub use commands::*;
pub use deadline::*;
pub use routines::*;
pub use sequence::*;

/// Everything an autonomous routine drives.
pub struct Subsystems {
    /// Drive base.
    pub drivetrain: Drivetrain,
    /// Catapult arm.
    pub shooter: Shooter,
    /// Roller intake.
    pub pickup: Pickup,
    /// Hot goal signal.
    pub vision: Box<dyn VisionSignal>,
}

/// Tunables read when a routine is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutonomousSettings {
    /// Encoder ticks to the shooting spot.
    pub drive_distance: f64,
    /// Added to the arm setpoint of the single shot routines.
    pub angle_offset: f64,
    /// Arm setpoint of the single shot routines.
    pub shooter_setpoint: f64,
    /// Arm setpoint of the two ball routine.
    pub shooter_10ft: f64,
    /// Clutch cooldown in milliseconds.
    pub reset_time_ms: f64,
}

impl AutonomousSettings {
    /// Reads the settings from `params`.
    pub fn from_params(params: &ParameterStore) -> Self {
        AutonomousSettings {
            drive_distance: params.get(Param::Drivetrain8ft),
            angle_offset: params.get(Param::ShooterAngleOffset),
            shooter_setpoint: params.get(Param::AutonomousShooterSetpoint),
            shooter_10ft: params.get(Param::Shooter10ft),
            reset_time_ms: params.get(Param::ShooterResetTime),
        }
    }
}

impl Default for AutonomousSettings {
    fn default() -> Self {
        Self::from_params(&ParameterStore::new())
    }
}

/// A complete autonomous routine.
pub trait AutonomousMode {
    /// Name used in logs.
    fn name(&self) -> &'static str;
    /// Called once when autonomous starts.
    fn init(&mut self, robot: &mut Subsystems);
    /// Called every control tick.
    fn run(&mut self, robot: &mut Subsystems);
    /// Whether the routine has reached its terminal state.
    fn is_done(&self) -> bool;
}

/// Common setup for the start of every routine: low gear, watchdog off,
/// catching aid and pickup lowered, sensors zeroed, rollers intaking.
pub fn prepare(robot: &mut Subsystems) {
    robot.drivetrain.arcade_drive(0.0, 0.0);
    robot.drivetrain.shift_down();
    robot.drivetrain.set_safety_enabled(false);
    robot.drivetrain.lower_catching_aid();
    robot.drivetrain.reset_encoders();
    robot.drivetrain.reset_gyro();
    robot.pickup.lower();
    robot.pickup.set_roller_speed(ROLLER_INTAKE);
}

/// Safe terminal outputs: drive stopped with the watchdog on, winch
/// stopped, catching aid and pickup lowered.
pub fn park(robot: &mut Subsystems) {
    robot.drivetrain.set_safety_enabled(true);
    robot.drivetrain.arcade_drive(0.0, 0.0);
    robot.drivetrain.lower_catching_aid();
    robot.pickup.lower();
    robot.shooter.set_winch(0.0);
}

/// Routines selectable from the numeric selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutonomousChoice {
    /// Drive, wait for the hot goal, shoot.
    Basic,
    /// Two shots from the starting spot, then drive forward.
    StationaryTwoBall,
    /// Wait for the hot goal, drive, shoot.
    HighGoal,
    /// Drive to the low goal and roll the ball out.
    LowGoal,
    /// The basic routine as a command queue.
    BasicSequence,
    /// Shoot, drive back for a second ball, shoot again.
    TwoBall,
}

impl AutonomousChoice {
    /// Maps a selector value to a routine.
    pub fn from_selector(selector: i64) -> Option<Self> {
        match selector {
            0 => Some(AutonomousChoice::Basic),
            1 => Some(AutonomousChoice::StationaryTwoBall),
            2 => Some(AutonomousChoice::HighGoal),
            3 => Some(AutonomousChoice::LowGoal),
            4 => Some(AutonomousChoice::BasicSequence),
            5 => Some(AutonomousChoice::TwoBall),
            _ => None,
        }
    }

    /// Builds the routine.
    pub fn build(self, settings: AutonomousSettings, clock: SharedClock) -> Box<dyn AutonomousMode> {
        match self {
            AutonomousChoice::Basic => Box::new(BasicAutonomous::new(settings, clock)),
            AutonomousChoice::StationaryTwoBall => {
                Box::new(StationaryTwoBallAutonomous::new(settings, clock))
            }
            AutonomousChoice::HighGoal => Box::new(HighGoalAutonomous::new(settings, clock)),
            AutonomousChoice::LowGoal => Box::new(LowGoalAutonomous::new(clock)),
            AutonomousChoice::BasicSequence => Box::new(basic_sequence(settings, clock)),
            AutonomousChoice::TwoBall => Box::new(TwoBallAutonomous::new(settings, clock)),
        }
    }
}

impl fmt::Display for AutonomousChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Builds the routine for `selector`, falling back to the basic command
/// sequence for unknown values.
pub fn select_mode(
    selector: i64,
    settings: AutonomousSettings,
    clock: SharedClock,
) -> Box<dyn AutonomousMode> {
    let choice = AutonomousChoice::from_selector(selector).unwrap_or_else(|| {
        log::warn!(
            "invalid autonomous selector {}, using the basic sequence",
            selector
        );
        AutonomousChoice::BasicSequence
    });
    log::info!("autonomous mode {}", choice);
    choice.build(settings, clock)
}
