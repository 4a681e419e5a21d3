// src/teleop.rs

//! # Teleop Mapper
//!
//! Turns one snapshot of the driver gamepad and the operator joystick into
//! subsystem commands. Momentary actions such as firing fire on the press
//! edge only; held buttons map to level commands.

use crate::autonomous::Subsystems;
use crate::params::{Param, ParameterStore, Tunable};
use crate::pickup::{ROLLER_EJECT, ROLLER_INTAKE};

/// Default stick deadband.
pub const DEFAULT_DEADBAND: f64 = 0.1;

/// Driver gamepad snapshot. Stick axes are raw, so pushing a stick forward
/// reads negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriverInputs {
    /// Left stick, vertical.
    pub left_y: f64,
    /// Right stick, horizontal.
    pub right_x: f64,
    /// Shift to low gear while held.
    pub left_bumper: bool,
    /// Shift to high gear while held.
    pub right_bumper: bool,
    /// Recalibrate the gyro while disabled.
    pub button_a: bool,
    /// Zero the encoders while disabled.
    pub button_b: bool,
    /// Reload constants while disabled.
    pub button_x: bool,
    /// Toggle the catching aid.
    pub button_y: bool,
}

/// Operator joystick snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OperatorPanel {
    /// Open-loop winch axis.
    pub winch_axis: f64,
    /// Fire.
    pub fire: bool,
    /// Reload.
    pub reload: bool,
    /// Nudge the arm up.
    pub bump_up: bool,
    /// Nudge the arm down.
    pub bump_down: bool,
    /// Aim from the range finder while held.
    pub auto_aim: bool,
    /// Hold the ten foot preset while held.
    pub preset: bool,
    /// Raise the pickup.
    pub pickup_raise: bool,
    /// Lower the pickup.
    pub pickup_lower: bool,
    /// Run the rollers inward while held.
    pub roller_intake: bool,
    /// Run the rollers outward while held.
    pub roller_eject: bool,
    /// Shooter manual override switch.
    pub manual_override: bool,
}

/// Everything read from the driver station in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OperatorInputs {
    /// Driver gamepad.
    pub driver: DriverInputs,
    /// Operator joystick.
    pub operator: OperatorPanel,
}

/// Drive mixing used in teleop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriveScheme {
    /// Direct throttle and turn mixing.
    #[default]
    Arcade,
    /// Shaped turning with saturation skimming.
    Cheesy,
}

/// Zeroes `value` inside `width` and rescales the rest to the full range.
pub fn deadband(value: f64, width: f64) -> f64 {
    if !value.is_finite() || value.abs() < width {
        return 0.0;
    }
    let span = 1.0 - width;
    if span <= 0.0 {
        return 0.0;
    }
    (value.signum() * (value.abs() - width) / span).clamp(-1.0, 1.0)
}

fn pressed(now: bool, before: bool) -> bool {
    now && !before
}

/// Maps operator inputs to subsystem commands.
#[derive(Debug, Clone)]
pub struct TeleopControl {
    scheme: DriveScheme,
    deadband: f64,
    preset_setpoint: f64,
    previous: OperatorInputs,
}

impl TeleopControl {
    /// Creates a mapper using `scheme`.
    pub fn new(scheme: DriveScheme, params: &ParameterStore) -> Self {
        TeleopControl {
            scheme,
            deadband: DEFAULT_DEADBAND,
            preset_setpoint: params.get(Param::Shooter10ft),
            previous: OperatorInputs::default(),
        }
    }

    /// Replaces the stick deadband.
    pub fn with_deadband(mut self, width: f64) -> Self {
        self.deadband = width;
        self
    }

    /// Active drive scheme.
    pub fn scheme(&self) -> DriveScheme {
        self.scheme
    }

    /// Switches the drive scheme.
    pub fn set_scheme(&mut self, scheme: DriveScheme) {
        self.scheme = scheme;
    }

    /// Hands the robot to the driver: watchdog on, every hold released.
    pub fn init(&mut self, robot: &mut Subsystems) {
        robot.drivetrain.set_safety_enabled(true);
        robot.drivetrain.arcade_drive(0.0, 0.0);
        self.previous = OperatorInputs::default();
    }

    /// Applies one snapshot of inputs.
    pub fn run(&mut self, robot: &mut Subsystems, inputs: &OperatorInputs) {
        self.drive(robot, &inputs.driver);
        self.shoot(robot, &inputs.operator);
        self.collect(robot, &inputs.operator);
        self.previous = *inputs;
    }

    fn drive(&mut self, robot: &mut Subsystems, driver: &DriverInputs) {
        let throttle = deadband(-driver.left_y, self.deadband);
        let turn = deadband(driver.right_x, self.deadband);
        match self.scheme {
            DriveScheme::Arcade => robot.drivetrain.arcade_drive(throttle, turn),
            DriveScheme::Cheesy => robot.drivetrain.cheesy_drive(throttle, turn),
        }

        if driver.left_bumper {
            robot.drivetrain.shift_down();
        } else if driver.right_bumper {
            robot.drivetrain.shift_up();
        }

        if pressed(driver.button_y, self.previous.driver.button_y) {
            robot.drivetrain.toggle_catching_aid();
        }
    }

    fn shoot(&mut self, robot: &mut Subsystems, operator: &OperatorPanel) {
        let before = &self.previous.operator;
        let shooter = &mut robot.shooter;
        if operator.manual_override != before.manual_override {
            shooter.set_manual_override(operator.manual_override);
        }

        let winch = deadband(operator.winch_axis, self.deadband);
        let was_winching = deadband(before.winch_axis, self.deadband) != 0.0;

        if pressed(operator.fire, before.fire) {
            shooter.fire();
        } else if pressed(operator.reload, before.reload) {
            shooter.reload();
        } else if pressed(operator.bump_up, before.bump_up) {
            shooter.bump_up();
        } else if pressed(operator.bump_down, before.bump_down) {
            shooter.bump_down();
        } else if operator.auto_aim {
            let distance = robot.drivetrain.get_range_finder_distance();
            shooter.auto_aim(distance);
        } else if operator.preset {
            shooter.set_position(self.preset_setpoint);
        } else if winch != 0.0 {
            shooter.set_winch(winch);
        } else if was_winching || before.auto_aim || before.preset {
            shooter.set_winch(0.0);
        }
    }

    fn collect(&mut self, robot: &mut Subsystems, operator: &OperatorPanel) {
        if operator.pickup_raise {
            robot.pickup.raise();
        } else if operator.pickup_lower {
            robot.pickup.lower();
        }

        if operator.roller_intake {
            robot.pickup.set_roller_speed(ROLLER_INTAKE);
        } else if operator.roller_eject {
            robot.pickup.set_roller_speed(ROLLER_EJECT);
        } else {
            robot.pickup.stop_rollers();
        }
    }
}

impl Tunable for TeleopControl {
    fn update_constants(&mut self, params: &ParameterStore) {
        self.preset_setpoint = params.get(Param::Shooter10ft);
    }
}
