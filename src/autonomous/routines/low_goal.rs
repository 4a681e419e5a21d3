// src/autonomous/routines/low_goal.rs

//! Drive into the low goal with the pickup raised and roll the ball out.

use super::transition;
use crate::autonomous::{prepare, AutonomousMode, Deadline, Subsystems};
use crate::pickup::ROLLER_EJECT;
use crate::timer::SharedClock;

/// Open-loop approach speed.
pub const LOW_GOAL_DRIVE_SPEED: f64 = 0.75;

/// Length of the approach, in milliseconds.
pub const LOW_GOAL_DRIVE_MS: f64 = 5000.0;

/// Time the rollers push the ball out, in milliseconds.
pub const LOW_GOAL_SCORE_MS: f64 = 3000.0;

/// States of [`LowGoalAutonomous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowGoalState {
    /// Driving at the goal.
    DriveToGoal,
    /// Rolling the ball out.
    Score,
    /// Stopped.
    Done,
}

/// Low goal routine.
pub struct LowGoalAutonomous {
    state: LowGoalState,
    deadline: Deadline,
}

impl LowGoalAutonomous {
    /// Creates the routine.
    pub fn new(clock: SharedClock) -> Self {
        LowGoalAutonomous {
            state: LowGoalState::DriveToGoal,
            deadline: Deadline::new(clock),
        }
    }

    /// Current state.
    pub fn state(&self) -> LowGoalState {
        self.state
    }

    fn goto(&mut self, next: LowGoalState) {
        transition("LowGoalAutonomous", &mut self.state, next);
    }
}

impl AutonomousMode for LowGoalAutonomous {
    fn name(&self) -> &'static str {
        "LowGoalAutonomous"
    }

    fn init(&mut self, robot: &mut Subsystems) {
        prepare(robot);
        robot.pickup.raise();
        robot.pickup.stop_rollers();
        self.state = LowGoalState::DriveToGoal;
        self.deadline.within_ms(LOW_GOAL_DRIVE_MS);
    }

    fn run(&mut self, robot: &mut Subsystems) {
        match self.state {
            LowGoalState::DriveToGoal => {
                robot.drivetrain.arcade_drive(LOW_GOAL_DRIVE_SPEED, 0.0);
                if self.deadline.expired() {
                    robot.drivetrain.arcade_drive(0.0, 0.0);
                    self.deadline.within_ms(LOW_GOAL_SCORE_MS);
                    self.goto(LowGoalState::Score);
                }
            }
            LowGoalState::Score => {
                robot.pickup.set_roller_speed(ROLLER_EJECT);
                if self.deadline.expired() {
                    robot.pickup.stop_rollers();
                    self.goto(LowGoalState::Done);
                }
            }
            LowGoalState::Done => {
                robot.drivetrain.set_safety_enabled(true);
                robot.drivetrain.arcade_drive(0.0, 0.0);
                robot.pickup.stop_rollers();
            }
        }
    }

    fn is_done(&self) -> bool {
        self.state == LowGoalState::Done
    }
}
