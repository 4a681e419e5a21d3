// src/autonomous/commands.rs

//! # Autonomous Commands
//!
//! Atomic steps for a [`CommandSequence`](super::CommandSequence).

use super::{AutonomousCommand, Deadline, Subsystems};
use crate::timer::SharedClock;

/// Default budget of [`WaitForHotGoal`], in milliseconds.
pub const HOT_GOAL_TIMEOUT_MS: f64 = 4000.0;

/// Holds a distance and heading until on target or out of time.
pub struct DriveStraight {
    distance: f64,
    timeout_ms: f64,
    deadline: Deadline,
}

impl DriveStraight {
    /// Drives `distance` encoder ticks within `timeout_ms`.
    pub fn new(distance: f64, timeout_ms: f64, clock: SharedClock) -> Self {
        DriveStraight {
            distance,
            timeout_ms,
            deadline: Deadline::new(clock),
        }
    }
}

impl AutonomousCommand for DriveStraight {
    fn name(&self) -> &'static str {
        "DriveStraight"
    }

    fn init(&mut self, _robot: &mut Subsystems) {
        self.deadline.within_ms(self.timeout_ms);
    }

    fn run(&mut self, robot: &mut Subsystems) {
        robot.drivetrain.drive_straight_distance(self.distance);
    }

    fn is_finished(&self, robot: &Subsystems) -> bool {
        self.deadline.until(robot.drivetrain.at_target()).is_done()
    }

    fn end(&mut self, robot: &mut Subsystems) {
        robot.drivetrain.arcade_drive(0.0, 0.0);
    }
}

/// Does nothing for a fixed time.
pub struct Wait {
    duration_ms: f64,
    deadline: Deadline,
}

impl Wait {
    /// Waits `duration_ms` milliseconds.
    pub fn new(duration_ms: f64, clock: SharedClock) -> Self {
        Wait {
            duration_ms,
            deadline: Deadline::new(clock),
        }
    }
}

impl AutonomousCommand for Wait {
    fn name(&self) -> &'static str {
        "Wait"
    }

    fn init(&mut self, _robot: &mut Subsystems) {
        self.deadline.within_ms(self.duration_ms);
    }

    fn run(&mut self, _robot: &mut Subsystems) {}

    fn is_finished(&self, _robot: &Subsystems) -> bool {
        self.deadline.expired()
    }

    fn end(&mut self, _robot: &mut Subsystems) {}
}

/// Waits until the vision system reports the goal hot, or out of time.
/// Vision processing is enabled for the duration of the wait.
pub struct WaitForHotGoal {
    timeout_ms: f64,
    deadline: Deadline,
}

impl WaitForHotGoal {
    /// Waits with the default budget.
    pub fn new(clock: SharedClock) -> Self {
        Self::with_timeout(HOT_GOAL_TIMEOUT_MS, clock)
    }

    /// Waits at most `timeout_ms` milliseconds.
    pub fn with_timeout(timeout_ms: f64, clock: SharedClock) -> Self {
        WaitForHotGoal {
            timeout_ms,
            deadline: Deadline::new(clock),
        }
    }
}

impl AutonomousCommand for WaitForHotGoal {
    fn name(&self) -> &'static str {
        "WaitForHotGoal"
    }

    fn init(&mut self, robot: &mut Subsystems) {
        self.deadline.within_ms(self.timeout_ms);
        robot.vision.set_enabled(true);
    }

    fn run(&mut self, _robot: &mut Subsystems) {}

    fn is_finished(&self, robot: &Subsystems) -> bool {
        self.deadline.until(robot.vision.goal_is_hot()).is_done()
    }

    fn end(&mut self, robot: &mut Subsystems) {
        robot.vision.set_enabled(false);
    }
}

/// Fires the shooter once.
#[derive(Debug, Default)]
pub struct Fire;

impl AutonomousCommand for Fire {
    fn name(&self) -> &'static str {
        "Fire"
    }

    fn init(&mut self, robot: &mut Subsystems) {
        robot.shooter.fire();
    }

    fn run(&mut self, _robot: &mut Subsystems) {}

    fn is_finished(&self, _robot: &Subsystems) -> bool {
        true
    }

    fn end(&mut self, _robot: &mut Subsystems) {}
}

/// Waits until the arm is back at the loading position, or out of time.
pub struct WaitForReload {
    timeout_ms: f64,
    deadline: Deadline,
}

impl WaitForReload {
    /// Waits at most `timeout_ms` milliseconds.
    pub fn new(timeout_ms: f64, clock: SharedClock) -> Self {
        WaitForReload {
            timeout_ms,
            deadline: Deadline::new(clock),
        }
    }
}

impl AutonomousCommand for WaitForReload {
    fn name(&self) -> &'static str {
        "WaitForReload"
    }

    fn init(&mut self, _robot: &mut Subsystems) {
        self.deadline.within_ms(self.timeout_ms);
    }

    fn run(&mut self, _robot: &mut Subsystems) {}

    fn is_finished(&self, robot: &Subsystems) -> bool {
        self.deadline
            .until(robot.shooter.at_loading_position())
            .is_done()
    }

    fn end(&mut self, _robot: &mut Subsystems) {}
}
