// src/autonomous/routines/high_goal.rs

//! Wait for the hot goal first, then drive up and shoot.

use super::{transition, RELOAD_TIMEOUT_MS};
use crate::autonomous::{
    park, prepare, AutonomousMode, AutonomousSettings, Deadline, Subsystems, DRIVE_TIMEOUT_MS,
};
use crate::timer::SharedClock;

/// Settle time before the vision signal is trusted, in milliseconds.
pub const VISION_SETTLE_MS: f64 = 1100.0;

/// Longest wait for a cold goal to turn hot, in milliseconds.
pub const HIGH_GOAL_HOT_TIMEOUT_MS: f64 = 3750.0;

/// States of [`HighGoalAutonomous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighGoalState {
    /// Letting vision settle, then reading it.
    CheckForHotGoal,
    /// Waiting for the goal to turn hot.
    WaitForHotGoal,
    /// Holding distance and arm angle on the way to the shooting spot.
    DriveForwards,
    /// Releasing the arm.
    Fire,
    /// Waiting for the arm to return to the loading position.
    WaitForReload,
    /// Parked.
    Done,
}

/// Hot goal first, single shot routine.
pub struct HighGoalAutonomous {
    settings: AutonomousSettings,
    state: HighGoalState,
    deadline: Deadline,
}

impl HighGoalAutonomous {
    /// Creates the routine.
    pub fn new(settings: AutonomousSettings, clock: SharedClock) -> Self {
        HighGoalAutonomous {
            settings,
            state: HighGoalState::CheckForHotGoal,
            deadline: Deadline::new(clock),
        }
    }

    /// Current state.
    pub fn state(&self) -> HighGoalState {
        self.state
    }

    fn goto(&mut self, next: HighGoalState) {
        transition("HighGoalAutonomous", &mut self.state, next);
    }

    fn start_drive(&mut self) {
        self.deadline.within_ms(DRIVE_TIMEOUT_MS);
        self.goto(HighGoalState::DriveForwards);
    }
}

impl AutonomousMode for HighGoalAutonomous {
    fn name(&self) -> &'static str {
        "HighGoalAutonomous"
    }

    fn init(&mut self, robot: &mut Subsystems) {
        prepare(robot);
        robot.vision.set_enabled(true);
        self.state = HighGoalState::CheckForHotGoal;
        self.deadline.within_ms(VISION_SETTLE_MS);
    }

    fn run(&mut self, robot: &mut Subsystems) {
        match self.state {
            HighGoalState::CheckForHotGoal => {
                if self.deadline.expired() {
                    if robot.vision.goal_is_hot() {
                        self.start_drive();
                    } else {
                        self.deadline.within_ms(HIGH_GOAL_HOT_TIMEOUT_MS);
                        self.goto(HighGoalState::WaitForHotGoal);
                    }
                }
            }
            HighGoalState::WaitForHotGoal => {
                if self.deadline.until(robot.vision.goal_is_hot()).is_done() {
                    self.start_drive();
                }
            }
            HighGoalState::DriveForwards => {
                robot
                    .drivetrain
                    .drive_straight_distance(self.settings.drive_distance);
                robot
                    .shooter
                    .set_position(self.settings.shooter_setpoint + self.settings.angle_offset);
                if self.deadline.until(robot.drivetrain.at_target()).is_done() {
                    robot.pickup.stop_rollers();
                    robot.drivetrain.arcade_drive(0.0, 0.0);
                    robot.shooter.set_winch(0.0);
                    self.goto(HighGoalState::Fire);
                }
            }
            HighGoalState::Fire => {
                robot.shooter.fire();
                self.deadline.within_ms(RELOAD_TIMEOUT_MS);
                self.goto(HighGoalState::WaitForReload);
            }
            HighGoalState::WaitForReload => {
                if self
                    .deadline
                    .until(robot.shooter.at_loading_position())
                    .is_done()
                {
                    robot.vision.set_enabled(false);
                    self.goto(HighGoalState::Done);
                }
            }
            HighGoalState::Done => park(robot),
        }
    }

    fn is_done(&self) -> bool {
        self.state == HighGoalState::Done
    }
}
