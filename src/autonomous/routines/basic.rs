// src/autonomous/routines/basic.rs

//! Drive to the shooting spot, wait for the goal in front to turn hot, shoot.

use super::{transition, RELOAD_TIMEOUT_MS};
use crate::autonomous::{
    park, prepare, AutonomousMode, AutonomousSettings, Deadline, Subsystems, DRIVE_TIMEOUT_MS,
};
use crate::timer::SharedClock;

/// Longest wait for a cold goal to turn hot, in milliseconds.
pub const BASIC_HOT_GOAL_TIMEOUT_MS: f64 = 2500.0;

/// States of [`BasicAutonomous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasicState {
    /// Holding distance and arm angle on the way to the shooting spot.
    DrivingForwards,
    /// Reading the vision signal once.
    CheckForHotGoal,
    /// Waiting for the goal to turn hot.
    WaitForHotGoal,
    /// Releasing the arm.
    Fire,
    /// Waiting for the arm to return to the loading position.
    WaitForReload,
    /// Parked.
    Done,
}

/// Single shot routine.
pub struct BasicAutonomous {
    settings: AutonomousSettings,
    state: BasicState,
    deadline: Deadline,
}

impl BasicAutonomous {
    /// Creates the routine.
    pub fn new(settings: AutonomousSettings, clock: SharedClock) -> Self {
        BasicAutonomous {
            settings,
            state: BasicState::DrivingForwards,
            deadline: Deadline::new(clock),
        }
    }

    /// Current state.
    pub fn state(&self) -> BasicState {
        self.state
    }

    fn goto(&mut self, next: BasicState) {
        transition("BasicAutonomous", &mut self.state, next);
    }
}

impl AutonomousMode for BasicAutonomous {
    fn name(&self) -> &'static str {
        "BasicAutonomous"
    }

    fn init(&mut self, robot: &mut Subsystems) {
        prepare(robot);
        robot.vision.set_enabled(true);
        self.state = BasicState::DrivingForwards;
        self.deadline.within_ms(DRIVE_TIMEOUT_MS);
    }

    fn run(&mut self, robot: &mut Subsystems) {
        match self.state {
            BasicState::DrivingForwards => {
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
                    self.goto(BasicState::CheckForHotGoal);
                }
            }
            BasicState::CheckForHotGoal => {
                if robot.vision.goal_is_hot() {
                    self.goto(BasicState::Fire);
                } else {
                    self.deadline.within_ms(BASIC_HOT_GOAL_TIMEOUT_MS);
                    self.goto(BasicState::WaitForHotGoal);
                }
            }
            BasicState::WaitForHotGoal => {
                if self.deadline.until(robot.vision.goal_is_hot()).is_done() {
                    self.goto(BasicState::Fire);
                }
            }
            BasicState::Fire => {
                robot.shooter.fire();
                self.deadline.within_ms(RELOAD_TIMEOUT_MS);
                self.goto(BasicState::WaitForReload);
            }
            BasicState::WaitForReload => {
                if self
                    .deadline
                    .until(robot.shooter.at_loading_position())
                    .is_done()
                {
                    robot.vision.set_enabled(false);
                    self.goto(BasicState::Done);
                }
            }
            BasicState::Done => park(robot),
        }
    }

    fn is_done(&self) -> bool {
        self.state == BasicState::Done
    }
}
