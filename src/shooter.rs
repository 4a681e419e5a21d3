// src/shooter.rs

//! # Shooter Controller
//!
//! Winch-driven catapult arm with a potentiometer for position feedback and
//! a pneumatic clutch that releases the arm to fire.
//!
//! ## Firing cycle
//!
//! Clutch engaged, arm movable → [`Shooter::fire`] releases the clutch and
//! starts the cooldown → once the cooldown has run out the background
//! [`WinchTask`] re-engages the clutch and reloads toward the loading
//! position → manual control resumes. While the cooldown runs every winch
//! command is replaced by a stop, and further `fire()` calls are discarded.

use crate::hal::{Dashboard, DigitalInput, MotorOutput, Potentiometer, Solenoid};
use crate::params::{Param, ParameterStore, Tunable};
use crate::pid::{IterativePid, PidGains};
use crate::timer::SharedClock;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub mod aim;
pub mod winch;

pub use aim::*;
pub use winch::{
    WinchJob, WinchTask, WinchWorker, BUMP_SPEED, BUMP_TICKS, DEFAULT_TASK_PERIOD, RELOAD_SPEED,
};

use winch::{lock, SharedWinch, WinchCore};

/// Hardware owned by the shooter.
pub struct ShooterIo {
    /// Winch motor. Positive drives the arm toward the loading position.
    pub winch: Box<dyn MotorOutput>,
    /// Clutch solenoid, on when engaged.
    pub clutch: Box<dyn Solenoid>,
    /// Limit switch at the loading position.
    pub load_switch: Box<dyn DigitalInput>,
    /// Limit switch at the far end of travel.
    pub max_switch: Box<dyn DigitalInput>,
    /// Arm position potentiometer.
    pub potentiometer: Box<dyn Potentiometer>,
    /// Ball present sensor.
    pub ball_sensor: Box<dyn DigitalInput>,
}

/// Shooter subsystem.
pub struct Shooter {
    core: SharedWinch,
    ball_sensor: Box<dyn DigitalInput>,
    position_pid: IterativePid,
    aim_table: AimTable<f64>,
    reset_time_ms: f64,
}

impl Shooter {
    /// Creates a shooter with the clutch engaged and the default aim table.
    pub fn new(io: ShooterIo, params: &ParameterStore, clock: SharedClock) -> Self {
        let core = WinchCore::new(
            io.winch,
            io.clutch,
            io.load_switch,
            io.max_switch,
            io.potentiometer,
            params.get(Param::ShooterLoadingVoltage),
            clock.clone(),
        );
        Shooter {
            core: Arc::new(Mutex::new(core)),
            ball_sensor: io.ball_sensor,
            position_pid: IterativePid::new(position_gains(params), clock),
            aim_table: AimTable::default(),
            reset_time_ms: params.get(Param::ShooterResetTime),
        }
    }

    /// Replaces the auto-aim table.
    pub fn with_aim_table(mut self, table: AimTable<f64>) -> Self {
        self.aim_table = table;
        self
    }

    /// Handle for polling the background winch work.
    pub fn winch_task(&self) -> WinchTask {
        WinchTask::new(Arc::clone(&self.core))
    }

    /// Starts a thread polling the winch task every `period`.
    pub fn spawn_worker(&self, period: Duration) -> io::Result<WinchWorker> {
        WinchWorker::spawn(self.winch_task(), period)
    }

    /// Holds the arm at `target` volts on the potentiometer.
    ///
    /// Cancels any running reload or bump. The first call after manual
    /// control resets the position controller.
    pub fn set_position(&mut self, target: f64) {
        let mut core = lock(&self.core);
        core.cancel_job();
        if core.manual_control {
            log::debug!("shooter position hold engaged at {:.2} V", target);
            core.manual_control = false;
            self.position_pid.reset();
        }
        let position = core.arm_position();
        let output = self.position_pid.run(target, position);
        core.apply_winch(output);
    }

    /// Holds the arm at the setpoint the aim table gives for `distance` inches.
    pub fn auto_aim(&mut self, distance: f64) {
        match self.aim_table.lookup(distance) {
            Some(setpoint) => self.set_position(setpoint),
            None => log::warn!("no aim setpoint for distance {}", distance),
        }
    }

    /// Drives the winch open-loop, cancelling any running job.
    pub fn set_winch(&mut self, speed: f64) {
        let mut core = lock(&self.core);
        core.manual_control = true;
        core.cancel_job();
        core.apply_winch(speed);
    }

    /// Releases the arm if a ball is loaded or the manual override is set.
    ///
    /// Calls made while the previous shot is still cooling down are discarded.
    pub fn fire(&mut self) {
        let mut core = lock(&self.core);
        core.service_clutch();
        if core.cooling_down() {
            log::warn!("fire ignored, clutch still cooling down");
            return;
        }
        if !self.ball_sensor.get() && !core.manual_override {
            log::debug!("fire ignored, no ball loaded");
            return;
        }

        log::info!("firing");
        core.cancel_job();
        core.manual_control = true;
        core.release_clutch(self.reset_time_ms);
        core.start_job(WinchJob::ReloadAfterFire);
    }

    /// Runs the winch toward the loading position until it gets there.
    pub fn reload(&mut self) {
        let mut core = lock(&self.core);
        core.manual_control = true;
        core.start_job(WinchJob::Reload);
    }

    /// Nudges the arm away from the loading position.
    pub fn bump_up(&mut self) {
        self.bump(-BUMP_SPEED);
    }

    /// Nudges the arm toward the loading position.
    pub fn bump_down(&mut self) {
        self.bump(BUMP_SPEED);
    }

    fn bump(&mut self, speed: f64) {
        let mut core = lock(&self.core);
        core.manual_control = true;
        core.start_job(WinchJob::Bump {
            speed,
            remaining: BUMP_TICKS,
        });
    }

    /// Allows firing without a ball and driving past the loading position.
    pub fn set_manual_override(&mut self, enabled: bool) {
        lock(&self.core).manual_override = enabled;
    }

    /// Whether the manual override is set.
    pub fn manual_override(&self) -> bool {
        lock(&self.core).manual_override
    }

    /// Whether the arm is at the loading position.
    pub fn at_loading_position(&self) -> bool {
        lock(&self.core).at_loading_position()
    }

    /// Whether the arm is at the far end of travel.
    pub fn at_max_position(&self) -> bool {
        lock(&self.core).at_max_position()
    }

    /// Whether a ball is loaded.
    pub fn ball_is_loaded(&self) -> bool {
        self.ball_sensor.get()
    }

    /// Whether the winch is driven open-loop.
    pub fn is_manual_control(&self) -> bool {
        lock(&self.core).manual_control
    }

    /// Whether the clutch is engaged.
    pub fn is_clutch_engaged(&self) -> bool {
        lock(&self.core).clutch_engaged()
    }

    /// Arm potentiometer voltage.
    pub fn get_arm_position(&self) -> f64 {
        lock(&self.core).arm_position()
    }

    /// Gains the position controller is running with.
    pub fn position_gains(&self) -> PidGains<f64> {
        self.position_pid.gains()
    }

    /// Publishes arm state.
    pub fn update_dashboard(&self, dashboard: &mut dyn Dashboard) {
        let mut core = lock(&self.core);
        dashboard.put_number("Arm Position", core.arm_position());
        dashboard.put_bool("Loading Position", core.at_loading_position());
        dashboard.put_bool("Max Position", core.at_max_position());
        dashboard.put_bool("Clutch Engaged", core.clutch_engaged());
        dashboard.put_bool("Ball Loaded", self.ball_sensor.get());
    }
}

fn position_gains(params: &ParameterStore) -> PidGains<f64> {
    PidGains::new(
        params.get(Param::ShooterP),
        params.get(Param::ShooterI),
        params.get(Param::ShooterD),
    )
}

impl Tunable for Shooter {
    fn update_constants(&mut self, params: &ParameterStore) {
        self.position_pid.set_pid(position_gains(params));
        self.reset_time_ms = params.get(Param::ShooterResetTime);
        lock(&self.core).loading_voltage = params.get(Param::ShooterLoadingVoltage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    /// Test that the winch is held at zero until the cooldown runs out.
    #[test]
    fn test_shooter_fire_cooldown_gate() {
        let (mut shooter, rig) = shooter_rig();
        rig.ball.set(true);
        shooter.fire();
        assert!(!rig.clutch.is_on(), "Fire should release the clutch.");

        shooter.set_winch(-1.0);
        assert!(value_close(0.0, rig.winch.speed()), "Cooldown must zero the winch.");

        rig.clock.advance_ms(1000);
        shooter.set_winch(-1.0);
        assert!(rig.clutch.is_on(), "Clutch should re-engage after the cooldown.");
        assert!(value_close(-1.0, rig.winch.speed()), "Command should pass after cooldown.");
    }

    /// Test the positive direction after the cooldown, subject to the loading gate.
    #[test]
    fn test_shooter_set_winch_after_cooldown() {
        let (mut shooter, rig) = shooter_rig();
        rig.ball.set(true);
        shooter.fire();
        shooter.set_winch(1.0);
        assert!(value_close(0.0, rig.winch.speed()));

        rig.clock.advance_ms(1000);
        shooter.set_winch(1.0);
        assert!(value_close(1.0, rig.winch.speed()));

        rig.load.set(true);
        shooter.set_winch(1.0);
        assert!(value_close(0.0, rig.winch.speed()), "Loading switch should stop the winch.");
    }

    /// Test that repeated fire calls during the cooldown do not restart it.
    #[test]
    fn test_shooter_fire_reentrant_discarded() {
        let (mut shooter, rig) = shooter_rig();
        rig.ball.set(true);
        shooter.fire();
        rig.clock.advance_ms(600);
        shooter.fire();
        rig.clock.advance_ms(400);

        shooter.winch_task().poll();
        assert!(rig.clutch.is_on(), "Cooldown should end 1000 ms after the first fire.");
    }

    /// Test that firing needs a ball or the manual override.
    #[test]
    fn test_shooter_fire_requires_ball_or_override() {
        let (mut shooter, rig) = shooter_rig();
        shooter.fire();
        assert!(rig.clutch.is_on(), "No ball, no fire.");

        shooter.set_manual_override(true);
        shooter.fire();
        assert!(!rig.clutch.is_on(), "Override should allow firing.");
    }

    /// Test the full fire, cooldown and reload cycle through the task.
    #[test]
    fn test_shooter_fire_then_reload() {
        let (mut shooter, rig) = shooter_rig();
        let task = shooter.winch_task();
        rig.ball.set(true);
        shooter.fire();
        assert_eq!(Some(WinchJob::ReloadAfterFire), task.pending());

        rig.clock.advance_ms(1000);
        task.poll();
        assert!(value_close(RELOAD_SPEED, rig.winch.speed()));
        assert_eq!(Some(WinchJob::Reload), task.pending());

        rig.load.set(true);
        task.poll();
        assert!(value_close(0.0, rig.winch.speed()));
        assert_eq!(None, task.pending());
        assert!(shooter.is_manual_control());
    }

    /// Test that a manual command cancels a reload before its next poll.
    #[test]
    fn test_shooter_set_winch_cancels_reload() {
        let (mut shooter, rig) = shooter_rig();
        let task = shooter.winch_task();
        shooter.reload();
        task.poll();
        assert!(value_close(RELOAD_SPEED, rig.winch.speed()));

        shooter.set_winch(-0.2);
        task.poll();
        assert_eq!(None, task.pending());
        assert!(value_close(-0.2, rig.winch.speed()), "Task must not write after cancel.");
    }

    /// Test bump direction and tick count.
    #[test]
    fn test_shooter_bump() {
        let (mut shooter, rig) = shooter_rig();
        let task = shooter.winch_task();
        shooter.bump_up();
        for _ in 0..BUMP_TICKS {
            task.poll();
            assert!(value_close(-BUMP_SPEED, rig.winch.speed()));
        }
        task.poll();
        assert!(value_close(0.0, rig.winch.speed()));

        shooter.bump_down();
        task.poll();
        assert!(value_close(BUMP_SPEED, rig.winch.speed()));
    }

    /// Test that the position hold resets on entry and drives toward the target.
    #[test]
    fn test_shooter_set_position() {
        let (mut shooter, rig) = shooter_rig();
        rig.pot.set_voltage(1.5);
        shooter.set_position(1.6);
        assert!(!shooter.is_manual_control());
        // ShooterP 2.0 over a 0.1 V error
        assert!(value_close(0.2, rig.winch.speed()));

        rig.pot.set_voltage(1.8);
        shooter.set_position(1.6);
        assert!(value_close(-0.4, rig.winch.speed()));

        shooter.set_winch(0.0);
        assert!(shooter.is_manual_control());
    }

    /// Test auto-aim interpolation bounds through the position hold.
    #[test]
    fn test_shooter_auto_aim_bounds() {
        let (shooter, rig) = shooter_rig();
        let mut shooter = shooter.with_aim_table(AimTable::new([(50.0, 1.0), (150.0, 2.0)]));
        rig.pot.set_voltage(1.0);

        shooter.auto_aim(10.0);
        assert!(value_close(0.0, rig.winch.speed()), "Below range clamps to the first entry.");

        shooter.auto_aim(400.0);
        assert!(value_close(1.0, rig.winch.speed()), "Above range clamps to the last entry.");

        rig.pot.set_voltage(1.5);
        shooter.auto_aim(125.0);
        // Interpolated setpoint 1.75 over a 1.5 V reading
        assert!(value_close(0.5, rig.winch.speed()));
    }

    /// Test the loading position reads and the reloaded threshold.
    #[test]
    fn test_shooter_loading_threshold() {
        let (mut shooter, rig) = shooter_rig();
        rig.pot.set_voltage(4.4);
        assert!(!shooter.at_loading_position());
        rig.pot.set_voltage(4.5);
        assert!(shooter.at_loading_position(), "Pot threshold stands in for the switch.");

        let mut params = ParameterStore::new();
        params.set(Param::ShooterLoadingVoltage, 4.8);
        params.set(Param::ShooterP, 3.0);
        shooter.update_constants(&params);
        assert!(!shooter.at_loading_position());
        assert!(value_close(3.0, shooter.position_gains().kp));
    }
}
