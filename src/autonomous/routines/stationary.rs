// src/autonomous/routines/stationary.rs

//! Two shots from the starting spot, then drive forward out of the zone.

use super::{transition, RELOAD_TIMEOUT_MS};
use crate::autonomous::{
    prepare, AutonomousMode, AutonomousSettings, Deadline, Subsystems, WaitOutcome,
};
use crate::pickup::ROLLER_INTAKE;
use crate::timer::SharedClock;

/// Time the rollers run at the start of each shot, in milliseconds.
pub const ROLLER_SETTLE_MS: f64 = 500.0;

/// Longest wait for the pickup to report lowered before firing anyway.
pub const PICKUP_LOWERED_TIMEOUT_MS: f64 = 2000.0;

/// Time the rollers feed the second ball, in milliseconds.
pub const FEED_TIMEOUT_MS: f64 = 2500.0;

/// Length of the final drive, in milliseconds.
pub const FINAL_DRIVE_MS: f64 = 2125.0;

/// Speed of the final drive. The robot starts facing away from the goal.
pub const FINAL_DRIVE_SPEED: f64 = -0.7;

/// States of [`StationaryTwoBallAutonomous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationaryState {
    /// Waiting for the pickup to be clear, then firing.
    Fire,
    /// Waiting for the arm to return to the loading position.
    WaitForReload,
    /// Feeding the second ball.
    Reload,
    /// Driving out of the zone.
    DriveForwards,
    /// Stopped.
    Done,
}

/// Two shot routine that never leaves the starting spot until the end.
pub struct StationaryTwoBallAutonomous {
    settings: AutonomousSettings,
    state: StationaryState,
    deadline: Deadline,
    first_shot: bool,
}

impl StationaryTwoBallAutonomous {
    /// Creates the routine.
    pub fn new(settings: AutonomousSettings, clock: SharedClock) -> Self {
        StationaryTwoBallAutonomous {
            settings,
            state: StationaryState::Fire,
            deadline: Deadline::new(clock),
            first_shot: true,
        }
    }

    /// Current state.
    pub fn state(&self) -> StationaryState {
        self.state
    }

    fn goto(&mut self, next: StationaryState) {
        transition("StationaryTwoBallAutonomous", &mut self.state, next);
    }
}

impl AutonomousMode for StationaryTwoBallAutonomous {
    fn name(&self) -> &'static str {
        "StationaryTwoBallAutonomous"
    }

    fn init(&mut self, robot: &mut Subsystems) {
        prepare(robot);
        self.state = StationaryState::Fire;
        self.first_shot = true;
        self.deadline.within_ms(PICKUP_LOWERED_TIMEOUT_MS);
    }

    fn run(&mut self, robot: &mut Subsystems) {
        match self.state {
            StationaryState::Fire => {
                if self.deadline.elapsed_ms() < ROLLER_SETTLE_MS {
                    robot.pickup.set_roller_speed(ROLLER_INTAKE);
                } else {
                    robot.pickup.stop_rollers();
                }

                let outcome = self.deadline.until(robot.pickup.is_lowered());
                if outcome.is_done() {
                    if outcome == WaitOutcome::TimedOut {
                        log::warn!("pickup not reported lowered, firing anyway");
                    }
                    robot.pickup.stop_rollers();
                    robot.shooter.fire();
                    if self.first_shot {
                        self.first_shot = false;
                        self.deadline.within_ms(RELOAD_TIMEOUT_MS);
                        self.goto(StationaryState::WaitForReload);
                    } else {
                        self.deadline.within_ms(FINAL_DRIVE_MS);
                        self.goto(StationaryState::DriveForwards);
                    }
                }
            }
            StationaryState::WaitForReload => {
                // The arm needs the clutch cooldown before the switch means anything
                if self.deadline.elapsed_ms() >= self.settings.reset_time_ms
                    && self
                        .deadline
                        .until(robot.shooter.at_loading_position())
                        .is_done()
                {
                    self.deadline.within_ms(FEED_TIMEOUT_MS);
                    self.goto(StationaryState::Reload);
                }
            }
            StationaryState::Reload => {
                robot.pickup.set_roller_speed(ROLLER_INTAKE);
                if self.deadline.expired() {
                    robot.pickup.stop_rollers();
                    self.deadline.within_ms(PICKUP_LOWERED_TIMEOUT_MS);
                    self.goto(StationaryState::Fire);
                }
            }
            StationaryState::DriveForwards => {
                if self.deadline.elapsed_ms() < self.settings.reset_time_ms {
                    robot.drivetrain.arcade_drive(0.0, 0.0);
                } else {
                    robot.drivetrain.drive_straight(FINAL_DRIVE_SPEED);
                }
                if self.deadline.expired() {
                    robot.drivetrain.arcade_drive(0.0, 0.0);
                    self.goto(StationaryState::Done);
                }
            }
            StationaryState::Done => {
                robot.drivetrain.set_safety_enabled(true);
                robot.drivetrain.arcade_drive(0.0, 0.0);
                robot.pickup.stop_rollers();
            }
        }
    }

    fn is_done(&self) -> bool {
        self.state == StationaryState::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    /// Test that a pickup that never reports lowered still gets a shot.
    #[test]
    fn test_stationary_pickup_wait_is_bounded() {
        let (mut robot, rig) = subsystems_rig();
        rig.shooter.ball.set(true);
        rig.pickup.lowered.set(true);
        let mut routine =
            StationaryTwoBallAutonomous::new(AutonomousSettings::default(), rig.clock.shared());
        routine.init(&mut robot);

        routine.run(&mut robot);
        assert!(value_close(ROLLER_INTAKE, rig.pickup.roller.speed()));
        rig.clock.advance_ms(600);
        routine.run(&mut robot);
        assert!(value_close(0.0, rig.pickup.roller.speed()));
        assert_eq!(StationaryState::Fire, routine.state());

        rig.clock.advance_ms(1400);
        routine.run(&mut robot);
        assert_eq!(StationaryState::WaitForReload, routine.state());
        assert!(!rig.shooter.clutch.is_on());
    }

    /// Test that the reload wait honours the cooldown before trusting the switch.
    #[test]
    fn test_stationary_reload_minimum_wait() {
        let (mut robot, rig) = subsystems_rig();
        rig.shooter.ball.set(true);
        let mut routine =
            StationaryTwoBallAutonomous::new(AutonomousSettings::default(), rig.clock.shared());
        routine.init(&mut robot);
        routine.run(&mut robot);
        assert_eq!(StationaryState::WaitForReload, routine.state());

        rig.shooter.load.set(true);
        rig.clock.advance_ms(500);
        routine.run(&mut robot);
        assert_eq!(StationaryState::WaitForReload, routine.state());
        rig.clock.advance_ms(500);
        routine.run(&mut robot);
        assert_eq!(StationaryState::Reload, routine.state());
    }

    /// Test the second shot and the delayed final drive.
    #[test]
    fn test_stationary_second_shot_and_drive() {
        let (mut robot, rig) = subsystems_rig();
        rig.shooter.ball.set(true);
        let mut routine =
            StationaryTwoBallAutonomous::new(AutonomousSettings::default(), rig.clock.shared());
        routine.init(&mut robot);
        routine.run(&mut robot);

        rig.clock.advance_ms(4000);
        routine.run(&mut robot);
        assert_eq!(StationaryState::Reload, routine.state());
        rig.clock.advance_ms(2500);
        routine.run(&mut robot);
        assert_eq!(StationaryState::Fire, routine.state());

        routine.run(&mut robot);
        assert_eq!(StationaryState::DriveForwards, routine.state());

        routine.run(&mut robot);
        assert!(value_close(0.0, rig.drive.drive.left()), "Drive waits out the cooldown.");
        rig.clock.advance_ms(1000);
        routine.run(&mut robot);
        assert!(rig.drive.drive.left() < 0.0, "Drive should back out of the zone.");

        rig.clock.advance_ms(1125);
        routine.run(&mut robot);
        assert!(routine.is_done());
        assert!(value_close(0.0, rig.drive.drive.left()));
    }
}
