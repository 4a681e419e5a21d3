// src/drivetrain.rs

//! # Drivetrain Controller
//!
//! Two-sided drive with shifting gearbox, encoders, gyro and range finder.
//! Owns a distance-hold and a heading-hold [`IterativePid`] and exposes the
//! manual and closed-loop driving primitives used by teleop and autonomous.
//!
//! ## Hold modes
//!
//! Every closed-loop primitive follows the same entry rule: if the drivetrain
//! was under manual control, the current gyro heading is captured as the
//! start angle, both PID controllers are reset, and manual control is
//! cleared. Later calls in the same hold reuse that baseline. Any manual
//! primitive ends the hold.

use crate::hal::{
    Dashboard, DoubleSolenoid, DriveOutputs, Encoder, Gyro, LastGood, RangeFinder, Solenoid,
    SolenoidDirection,
};
use crate::params::{Param, ParameterStore, Tunable};
use crate::pid::{IterativePid, PidGains};
use crate::timer::SharedClock;
use std::cell::Cell;

pub mod shaping;
pub use shaping::*;

/// Distance error, in encoder ticks, below which a distance hold is on target.
pub const DISTANCE_TOLERANCE_TICKS: f64 = 200.0;

/// Gyro sensitivity applied at init, in volts per degree per second.
pub const GYRO_SENSITIVITY: f64 = 0.007;

/// Range error, in inches, treated as arrived by the range finder approach.
pub const RANGE_TOLERANCE_INCHES: f64 = 1.0;

/// Hardware owned by the drivetrain.
pub struct DrivetrainIo {
    /// Left and right drive motors.
    pub drive: Box<dyn DriveOutputs>,
    /// Gear shifting solenoid, on for high gear.
    pub shifter: Box<dyn Solenoid>,
    /// Catching aid arms.
    pub catching_aid: Box<dyn DoubleSolenoid>,
    /// Left side encoder.
    pub left_encoder: Box<dyn Encoder>,
    /// Right side encoder.
    pub right_encoder: Box<dyn Encoder>,
    /// Heading gyro.
    pub gyro: Box<dyn Gyro>,
    /// Forward-facing ultrasonic sensor.
    pub range_finder: Box<dyn RangeFinder>,
}

/// Tunable gains used by the drivetrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrivetrainGains {
    /// Distance hold gains in low gear.
    pub distance_low: PidGains<f64>,
    /// Distance hold gains in high gear.
    pub distance_high: PidGains<f64>,
    /// Heading hold gains.
    pub angle: PidGains<f64>,
    /// Cheesy drive shaping.
    pub cheesy: CheesyConfig<f64>,
}

impl DrivetrainGains {
    /// Reads every drivetrain gain from `params`.
    pub fn from_params(params: &ParameterStore) -> Self {
        DrivetrainGains {
            distance_low: PidGains::new(
                params.get(Param::DrivetrainDistanceLowP),
                params.get(Param::DrivetrainDistanceLowI),
                params.get(Param::DrivetrainDistanceLowD),
            ),
            distance_high: PidGains::new(
                params.get(Param::DrivetrainDistanceHighP),
                params.get(Param::DrivetrainDistanceHighI),
                params.get(Param::DrivetrainDistanceHighD),
            ),
            angle: PidGains::new(
                params.get(Param::DrivetrainAngleP),
                params.get(Param::DrivetrainAngleI),
                params.get(Param::DrivetrainAngleD),
            ),
            cheesy: CheesyConfig {
                turn_gain: params.get(Param::DrivetrainTurnGain),
                quick_turn_threshold: params.get(Param::DrivetrainQuickTurnThreshold),
                skim_gain: params.get(Param::DrivetrainSkimGain),
                wheel_non_linearity: params.get(Param::DrivetrainWheelNonLinearity),
            },
        }
    }
}

/// Drivetrain subsystem.
pub struct Drivetrain {
    io: DrivetrainIo,
    distance_pid: IterativePid,
    angle_pid: IterativePid,
    gains: DrivetrainGains,
    start_angle: f64,
    manual_control: bool,
    at_target: bool,
    high_gear: bool,
    gyro_reading: Cell<LastGood>,
    range_reading: Cell<LastGood>,
}

fn filtered(cell: &Cell<LastGood>, raw: f64) -> f64 {
    let mut filter = cell.get();
    let value = filter.filter(raw);
    cell.set(filter);
    value
}

impl Drivetrain {
    /// Creates a drivetrain in low gear under manual control.
    pub fn new(io: DrivetrainIo, params: &ParameterStore, clock: SharedClock) -> Self {
        let gains = DrivetrainGains::from_params(params);
        Drivetrain {
            io,
            distance_pid: IterativePid::new(gains.distance_low, clock.clone()),
            angle_pid: IterativePid::new(gains.angle, clock),
            gains,
            start_angle: 0.0,
            manual_control: true,
            at_target: false,
            high_gear: false,
            gyro_reading: Cell::new(LastGood::new("gyro")),
            range_reading: Cell::new(LastGood::new("range finder")),
        }
    }

    /// Configures and zeroes the sensors.
    pub fn init(&mut self) {
        log::debug!("initializing drivetrain");
        self.io.gyro.set_sensitivity(GYRO_SENSITIVITY);
        self.reset_gyro();
        self.reset_encoders();
    }

    /// Arcade driving under manual control.
    pub fn arcade_drive(&mut self, move_value: f64, turn: f64) {
        self.manual_control = true;
        self.drive_arcade(move_value, turn);
    }

    /// Cheesy driving: shaped turn, quick-turn boost and saturation skimming.
    /// Leaves the manual control flag untouched.
    pub fn cheesy_drive(&mut self, throttle: f64, turn: f64) {
        let (left, right) = cheesy_mix(throttle, turn, self.gains.cheesy);
        self.io.drive.set_left_right(left, right);
    }

    /// Drives forward at `speed` while holding the entry heading.
    pub fn drive_straight(&mut self, speed: f64) {
        self.enter_hold(false);
        let turn = self.angle_pid.run(self.start_angle, self.get_gyro_angle());
        self.drive_arcade(speed, turn);
    }

    /// Drives to `distance` encoder ticks from the hold entry point while
    /// holding the entry heading. Encoders are zeroed on entry.
    ///
    /// [`Drivetrain::at_target`] reflects the tolerance check of the latest
    /// call only, so callers poll it every tick.
    pub fn drive_straight_distance(&mut self, distance: f64) {
        self.enter_hold(true);
        let average = self.get_average_encoder_value();
        self.at_target = (distance - average).abs() < DISTANCE_TOLERANCE_TICKS;
        let move_value = self.distance_pid.run(distance, average);
        let turn = self.angle_pid.run(self.start_angle, self.get_gyro_angle());
        self.drive_arcade(move_value, turn);
    }

    /// Bang-bang approach to `distance` inches from whatever is ahead.
    pub fn drive_to_range_finder_distance(&mut self, distance: f64, speed: f64) {
        self.enter_hold(false);
        let error = self.get_range_finder_distance() - distance;
        let speed = speed.abs();
        if error > RANGE_TOLERANCE_INCHES {
            self.drive_arcade(speed, 0.0);
        } else if error < -RANGE_TOLERANCE_INCHES {
            self.drive_arcade(-speed, 0.0);
        } else {
            self.drive_arcade(0.0, 0.0);
        }
    }

    /// Turns in place by `delta_angle` degrees from the entry heading.
    pub fn turn(&mut self, delta_angle: f64) {
        self.enter_hold(false);
        let turn = self
            .angle_pid
            .run(self.start_angle + delta_angle, self.get_gyro_angle());
        self.drive_arcade(0.0, turn);
    }

    /// Turns in place to the absolute heading `angle`.
    pub fn turn_to_angle(&mut self, angle: f64) {
        self.enter_hold(false);
        let gyro = self.get_gyro_angle();
        log::trace!("turning to {} from {}", angle, gyro);
        let turn = self.angle_pid.run(angle, gyro);
        self.drive_arcade(0.0, turn);
    }

    /// Shifts into high gear and switches the distance gains.
    pub fn shift_up(&mut self) {
        self.high_gear = true;
        self.io.shifter.set(true);
        self.distance_pid.set_pid(self.gains.distance_high);
    }

    /// Shifts into low gear and switches the distance gains.
    pub fn shift_down(&mut self) {
        self.high_gear = false;
        self.io.shifter.set(false);
        self.distance_pid.set_pid(self.gains.distance_low);
    }

    /// Raises the catching aid arms.
    pub fn raise_catching_aid(&mut self) {
        self.io.catching_aid.set(SolenoidDirection::Forward);
    }

    /// Lowers the catching aid arms.
    pub fn lower_catching_aid(&mut self) {
        self.io.catching_aid.set(SolenoidDirection::Reverse);
    }

    /// Flips the catching aid arms.
    pub fn toggle_catching_aid(&mut self) {
        if self.io.catching_aid.get() == SolenoidDirection::Forward {
            self.lower_catching_aid();
        } else {
            self.raise_catching_aid();
        }
    }

    /// Zeroes the gyro heading.
    pub fn reset_gyro(&mut self) {
        self.io.gyro.reset();
    }

    /// Fully recalibrates the gyro. Only while stationary.
    pub fn reinit_gyro(&mut self) {
        log::info!("recalibrating gyro");
        self.io.gyro.reinit();
        self.io.gyro.set_sensitivity(GYRO_SENSITIVITY);
        self.io.gyro.reset();
    }

    /// Zeroes both encoders.
    pub fn reset_encoders(&mut self) {
        self.io.left_encoder.reset();
        self.io.right_encoder.reset();
    }

    /// Enables or disables the drive output watchdog.
    pub fn set_safety_enabled(&mut self, enabled: bool) {
        self.io.drive.set_safety_enabled(enabled);
    }

    /// Mean of the left and right encoder counts.
    pub fn get_average_encoder_value(&self) -> f64 {
        (f64::from(self.io.left_encoder.get()) + f64::from(self.io.right_encoder.get())) / 2.0
    }

    /// Gyro heading in degrees.
    pub fn get_gyro_angle(&self) -> f64 {
        filtered(&self.gyro_reading, self.io.gyro.angle())
    }

    /// Range finder distance in inches.
    pub fn get_range_finder_distance(&self) -> f64 {
        filtered(&self.range_reading, self.io.range_finder.range_inches())
    }

    /// Whether the drivetrain is being driven open-loop.
    pub fn is_manual_control(&self) -> bool {
        self.manual_control
    }

    /// Whether the latest distance hold tick was within tolerance.
    pub fn at_target(&self) -> bool {
        self.at_target
    }

    /// Whether high gear is selected.
    pub fn is_high_gear(&self) -> bool {
        self.high_gear
    }

    /// Heading captured when the current hold began.
    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    /// Active gains.
    pub fn gains(&self) -> &DrivetrainGains {
        &self.gains
    }

    /// Gains the distance controller is running with.
    pub fn distance_gains(&self) -> PidGains<f64> {
        self.distance_pid.gains()
    }

    /// Publishes sensor readings.
    pub fn update_dashboard(&self, dashboard: &mut dyn Dashboard) {
        dashboard.put_number("LeftEncoder", f64::from(self.io.left_encoder.get()));
        dashboard.put_number("RightEncoder", f64::from(self.io.right_encoder.get()));
        dashboard.put_number("Gyro", self.get_gyro_angle());
        dashboard.put_number("Range Finder", self.get_range_finder_distance());
        dashboard.put_bool("High Gear", self.high_gear);
        dashboard.put_bool("At Target", self.at_target);
    }

    fn enter_hold(&mut self, reset_encoders: bool) {
        if !self.manual_control {
            return;
        }
        self.manual_control = false;
        self.start_angle = self.get_gyro_angle();
        self.distance_pid.reset();
        self.angle_pid.reset();
        if reset_encoders {
            self.reset_encoders();
        }
        log::debug!("drivetrain hold engaged at {:.2} degrees", self.start_angle);
    }

    fn drive_arcade(&mut self, move_value: f64, turn: f64) {
        let (left, right) = arcade_mix(move_value, turn);
        self.io.drive.set_left_right(left, right);
    }
}

impl Tunable for Drivetrain {
    fn update_constants(&mut self, params: &ParameterStore) {
        self.gains = DrivetrainGains::from_params(params);
        self.angle_pid.set_pid(self.gains.angle);
        let distance = if self.high_gear {
            self.gains.distance_high
        } else {
            self.gains.distance_low
        };
        self.distance_pid.set_pid(distance);
    }
}
