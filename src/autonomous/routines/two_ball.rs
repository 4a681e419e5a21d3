// src/autonomous/routines/two_ball.rs

//! Shoot, drive back to collect the second ball, return and shoot again.

use super::{transition, RELOAD_TIMEOUT_MS};
use crate::autonomous::{
    park, prepare, AutonomousMode, AutonomousSettings, Deadline, Subsystems, DRIVE_TIMEOUT_MS,
};
use crate::pickup::ROLLER_INTAKE;
use crate::timer::SharedClock;

/// Time given to the pickup to collect the second ball, in milliseconds.
pub const PICKUP_TIMEOUT_MS: f64 = 1500.0;

/// Extra time after the clutch cooldown before moving on from a shot.
pub const FIRE_MARGIN_MS: f64 = 100.0;

/// States of [`TwoBallAutonomous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwoBallState {
    /// Holding distance and arm angle on the way to the shooting spot.
    DriveForwards,
    /// Waiting out the shot.
    Fire,
    /// Driving back to the second ball.
    DriveBackAndReload,
    /// Running the pickup.
    PickupSecondBall,
    /// Waiting for the arm to return to the loading position.
    WaitForReload,
    /// Parked.
    Done,
}

/// Two shot routine with a drive back for the second ball.
pub struct TwoBallAutonomous {
    settings: AutonomousSettings,
    state: TwoBallState,
    deadline: Deadline,
    first_shot: bool,
}

impl TwoBallAutonomous {
    /// Creates the routine.
    pub fn new(settings: AutonomousSettings, clock: SharedClock) -> Self {
        TwoBallAutonomous {
            settings,
            state: TwoBallState::DriveForwards,
            deadline: Deadline::new(clock),
            first_shot: true,
        }
    }

    /// Current state.
    pub fn state(&self) -> TwoBallState {
        self.state
    }

    fn goto(&mut self, next: TwoBallState) {
        transition("TwoBallAutonomous", &mut self.state, next);
    }
}

impl AutonomousMode for TwoBallAutonomous {
    fn name(&self) -> &'static str {
        "TwoBallAutonomous"
    }

    fn init(&mut self, robot: &mut Subsystems) {
        prepare(robot);
        self.state = TwoBallState::DriveForwards;
        self.first_shot = true;
        self.deadline.within_ms(DRIVE_TIMEOUT_MS);
    }

    fn run(&mut self, robot: &mut Subsystems) {
        match self.state {
            TwoBallState::DriveForwards => {
                robot
                    .drivetrain
                    .drive_straight_distance(self.settings.drive_distance);
                robot.shooter.set_position(self.settings.shooter_10ft);
                if self.deadline.until(robot.drivetrain.at_target()).is_done() {
                    robot.pickup.stop_rollers();
                    robot.drivetrain.arcade_drive(0.0, 0.0);
                    robot.shooter.set_winch(0.0);
                    robot.shooter.fire();
                    self.deadline
                        .within_ms(self.settings.reset_time_ms + FIRE_MARGIN_MS);
                    self.goto(TwoBallState::Fire);
                }
            }
            TwoBallState::Fire => {
                if self.deadline.expired() {
                    if self.first_shot {
                        self.first_shot = false;
                        self.deadline.within_ms(DRIVE_TIMEOUT_MS);
                        self.goto(TwoBallState::DriveBackAndReload);
                    } else {
                        self.deadline.within_ms(RELOAD_TIMEOUT_MS);
                        self.goto(TwoBallState::WaitForReload);
                    }
                }
            }
            TwoBallState::DriveBackAndReload => {
                robot
                    .drivetrain
                    .drive_straight_distance(-self.settings.drive_distance);
                if self.deadline.until(robot.drivetrain.at_target()).is_done() {
                    robot.drivetrain.arcade_drive(0.0, 0.0);
                    robot.pickup.set_roller_speed(ROLLER_INTAKE);
                    self.deadline.within_ms(PICKUP_TIMEOUT_MS);
                    self.goto(TwoBallState::PickupSecondBall);
                }
            }
            TwoBallState::PickupSecondBall => {
                if self.deadline.until(robot.shooter.ball_is_loaded()).is_done() {
                    robot.pickup.stop_rollers();
                    self.deadline.within_ms(DRIVE_TIMEOUT_MS);
                    self.goto(TwoBallState::DriveForwards);
                }
            }
            TwoBallState::WaitForReload => {
                if self
                    .deadline
                    .until(robot.shooter.at_loading_position())
                    .is_done()
                {
                    self.goto(TwoBallState::Done);
                }
            }
            TwoBallState::Done => park(robot),
        }
    }

    fn is_done(&self) -> bool {
        self.state == TwoBallState::Done
    }
}
