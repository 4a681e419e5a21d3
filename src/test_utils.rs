// src/test_utils.rs

//! This module contains utilities for testing.
//!
//! Each rig bundles a controller with handles to the simulated devices it
//! was built on, so a test can poke inputs and read outputs after the
//! hardware has been moved into the controller.

use crate::autonomous::Subsystems;
use crate::drivetrain::{Drivetrain, DrivetrainIo};
use crate::params::ParameterStore;
use crate::pickup::{Pickup, PickupIo};
use crate::robot::{Robot, RobotIo};
use crate::shooter::{Shooter, ShooterIo};
use crate::sim::*;
use crate::timer::ManualClock;

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f64 = 1e-5;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` is less than
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_close(target: f64, value: f64) -> bool {
    (target - value).abs() < TEST_TOLERANCE
}

/// Device handles behind a [`Drivetrain`].
pub struct DrivetrainRig {
    pub clock: ManualClock,
    pub drive: SimDrive,
    pub shifter: SimSolenoid,
    pub catching_aid: SimDoubleSolenoid,
    pub left: SimEncoder,
    pub right: SimEncoder,
    pub gyro: SimGyro,
    pub range: SimRangeFinder,
}

/// Device handles behind a [`Shooter`].
pub struct ShooterRig {
    pub clock: ManualClock,
    pub winch: SimMotor,
    pub clutch: SimSolenoid,
    pub load: SimSwitch,
    pub max: SimSwitch,
    pub pot: SimPotentiometer,
    pub ball: SimSwitch,
}

/// Device handles behind a [`Pickup`].
pub struct PickupRig {
    pub roller: SimMotor,
    pub deploy: SimDoubleSolenoid,
    pub lowered: SimSwitch,
}

/// Device handles behind a full [`Subsystems`] set, all on one clock.
pub struct SubsystemsRig {
    pub clock: ManualClock,
    pub drive: DrivetrainRig,
    pub shooter: ShooterRig,
    pub pickup: PickupRig,
    pub vision: SimVision,
}

/// Handles behind a [`Robot`].
pub struct RobotRig {
    pub io: SubsystemsRig,
    pub constants: SimConstants,
    pub dashboard: SimDashboard,
}

fn drivetrain_io(clock: &ManualClock) -> (DrivetrainIo, DrivetrainRig) {
    let rig = DrivetrainRig {
        clock: clock.clone(),
        drive: SimDrive::new(),
        shifter: SimSolenoid::new(),
        catching_aid: SimDoubleSolenoid::new(),
        left: SimEncoder::new(),
        right: SimEncoder::new(),
        gyro: SimGyro::new(),
        range: SimRangeFinder::new(),
    };
    let io = DrivetrainIo {
        drive: Box::new(rig.drive.clone()),
        shifter: Box::new(rig.shifter.clone()),
        catching_aid: Box::new(rig.catching_aid.clone()),
        left_encoder: Box::new(rig.left.clone()),
        right_encoder: Box::new(rig.right.clone()),
        gyro: Box::new(rig.gyro.clone()),
        range_finder: Box::new(rig.range.clone()),
    };
    (io, rig)
}

fn shooter_io(clock: &ManualClock) -> (ShooterIo, ShooterRig) {
    let rig = ShooterRig {
        clock: clock.clone(),
        winch: SimMotor::new(),
        clutch: SimSolenoid::new(),
        load: SimSwitch::new(),
        max: SimSwitch::new(),
        pot: SimPotentiometer::new(),
        ball: SimSwitch::new(),
    };
    let io = ShooterIo {
        winch: Box::new(rig.winch.clone()),
        clutch: Box::new(rig.clutch.clone()),
        load_switch: Box::new(rig.load.clone()),
        max_switch: Box::new(rig.max.clone()),
        potentiometer: Box::new(rig.pot.clone()),
        ball_sensor: Box::new(rig.ball.clone()),
    };
    (io, rig)
}

fn pickup_io() -> (PickupIo, PickupRig) {
    let rig = PickupRig {
        roller: SimMotor::new(),
        deploy: SimDoubleSolenoid::new(),
        lowered: SimSwitch::new(),
    };
    let io = PickupIo {
        roller: Box::new(rig.roller.clone()),
        deploy: Box::new(rig.deploy.clone()),
        lowered_switch: Box::new(rig.lowered.clone()),
    };
    (io, rig)
}

/// Hardware for a whole robot plus the handles to drive it.
pub fn robot_io(clock: &ManualClock) -> (RobotIo, SubsystemsRig) {
    let (drivetrain, drive) = drivetrain_io(clock);
    let (shooter, shooter_rig) = shooter_io(clock);
    let (pickup, pickup_rig) = pickup_io();
    let vision = SimVision::new();
    let io = RobotIo {
        drivetrain,
        shooter,
        pickup,
        vision: Box::new(vision.clone()),
    };
    let rig = SubsystemsRig {
        clock: clock.clone(),
        drive,
        shooter: shooter_rig,
        pickup: pickup_rig,
        vision,
    };
    (io, rig)
}

/// A drivetrain with default constants. `init` has not been called.
pub fn drivetrain_rig() -> (Drivetrain, DrivetrainRig) {
    let clock = ManualClock::new();
    let (io, rig) = drivetrain_io(&clock);
    let drivetrain = Drivetrain::new(io, &ParameterStore::new(), clock.shared());
    (drivetrain, rig)
}

/// A shooter with default constants.
pub fn shooter_rig() -> (Shooter, ShooterRig) {
    let clock = ManualClock::new();
    let (io, rig) = shooter_io(&clock);
    let shooter = Shooter::new(io, &ParameterStore::new(), clock.shared());
    (shooter, rig)
}

/// A pickup.
pub fn pickup_rig() -> (Pickup, PickupRig) {
    let (io, rig) = pickup_io();
    (Pickup::new(io), rig)
}

/// Every subsystem with default constants, sharing one clock.
pub fn subsystems_rig() -> (Subsystems, SubsystemsRig) {
    let clock = ManualClock::new();
    let (io, rig) = robot_io(&clock);
    let params = ParameterStore::new();
    let subsystems = Subsystems {
        drivetrain: Drivetrain::new(io.drivetrain, &params, clock.shared()),
        shooter: Shooter::new(io.shooter, &params, clock.shared()),
        pickup: Pickup::new(io.pickup),
        vision: io.vision,
    };
    (subsystems, rig)
}

/// A robot whose constants source starts out holding `constants`.
pub fn robot_rig(constants: &str) -> (Robot, RobotRig) {
    let clock = ManualClock::new();
    let (io, subsystems) = robot_io(&clock);
    let rig = RobotRig {
        io: subsystems,
        constants: SimConstants::new(constants),
        dashboard: SimDashboard::new(),
    };
    let robot = Robot::new(
        io,
        Box::new(rig.constants.clone()),
        Box::new(rig.dashboard.clone()),
        clock.shared(),
    );
    (robot, rig)
}
