// src/shooter/winch.rs

//! # Winch Task
//!
//! The winch motor, clutch and arm sensors live behind one mutex shared by the
//! control tick and a background task. Every winch write happens while that
//! lock is held, so a manual command that cancels a running job can never be
//! followed by a stale write from the task.
//!
//! The background task is a [`WinchTask`] polled either inline by the owner of
//! the control loop or by a [`WinchWorker`] thread at its own period.

use crate::hal::{DigitalInput, LastGood, MotorOutput, Potentiometer, Solenoid};
use crate::timer::{SharedClock, Timer};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Winch speed used while reloading toward the loading position.
pub const RELOAD_SPEED: f64 = 1.0;

/// Winch speed used by a bump.
pub const BUMP_SPEED: f64 = 0.3;

/// Background task polls a bump runs for.
pub const BUMP_TICKS: u32 = 5;

/// Default background task period.
pub const DEFAULT_TASK_PERIOD: Duration = Duration::from_millis(40);

/// Open-loop winch work carried out by the background task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WinchJob {
    /// Waiting for the clutch cooldown, then reloading.
    ReloadAfterFire,
    /// Driving toward the loading position.
    Reload,
    /// Driving at `speed` for `remaining` more polls.
    Bump {
        /// Signed winch command.
        speed: f64,
        /// Polls left before stopping.
        remaining: u32,
    },
}

/// Winch hardware plus the state touched by both the tick and the task.
pub(crate) struct WinchCore {
    winch: Box<dyn MotorOutput>,
    clutch: Box<dyn Solenoid>,
    load_switch: Box<dyn DigitalInput>,
    max_switch: Box<dyn DigitalInput>,
    potentiometer: Box<dyn Potentiometer>,
    pot_reading: LastGood,
    clutch_engaged: bool,
    clutch_timer: Timer,
    job: Option<WinchJob>,
    pub(crate) manual_control: bool,
    pub(crate) manual_override: bool,
    pub(crate) loading_voltage: f64,
}

impl WinchCore {
    pub(crate) fn new(
        winch: Box<dyn MotorOutput>,
        mut clutch: Box<dyn Solenoid>,
        load_switch: Box<dyn DigitalInput>,
        max_switch: Box<dyn DigitalInput>,
        potentiometer: Box<dyn Potentiometer>,
        loading_voltage: f64,
        clock: SharedClock,
    ) -> Self {
        clutch.set(true);
        WinchCore {
            winch,
            clutch,
            load_switch,
            max_switch,
            potentiometer,
            pot_reading: LastGood::new("potentiometer"),
            clutch_engaged: true,
            clutch_timer: Timer::new(clock),
            job: None,
            manual_control: true,
            manual_override: false,
            loading_voltage,
        }
    }

    pub(crate) fn arm_position(&mut self) -> f64 {
        self.pot_reading.filter(self.potentiometer.average_voltage())
    }

    /// Limit switch, or the potentiometer past the loading threshold.
    pub(crate) fn at_loading_position(&mut self) -> bool {
        self.load_switch.get() || self.arm_position() >= self.loading_voltage
    }

    pub(crate) fn at_max_position(&self) -> bool {
        self.max_switch.get()
    }

    pub(crate) fn clutch_engaged(&self) -> bool {
        self.clutch_engaged
    }

    pub(crate) fn cooling_down(&self) -> bool {
        !self.clutch_engaged || !self.clutch_timer.has_expired()
    }

    pub(crate) fn job(&self) -> Option<WinchJob> {
        self.job
    }

    pub(crate) fn start_job(&mut self, job: WinchJob) {
        if let Some(previous) = self.job.replace(job) {
            log::debug!("winch job {:?} replaced by {:?}", previous, job);
        }
    }

    pub(crate) fn cancel_job(&mut self) {
        if let Some(job) = self.job.take() {
            log::debug!("winch job {:?} cancelled", job);
        }
    }

    /// Disengages the clutch and starts the cooldown.
    pub(crate) fn release_clutch(&mut self, reset_time_ms: f64) {
        self.winch.set(0.0);
        self.clutch.set(false);
        self.clutch_engaged = false;
        self.clutch_timer.set_expiration_ms(reset_time_ms);
    }

    /// Re-engages the clutch once the cooldown has run out.
    pub(crate) fn service_clutch(&mut self) {
        if !self.clutch_engaged && self.clutch_timer.has_expired() {
            log::debug!("clutch re-engaged");
            self.clutch.set(true);
            self.clutch_engaged = true;
        }
    }

    /// Writes `speed` to the winch unless a gate forbids it, in which case
    /// the winch is stopped instead. Returns the value written.
    pub(crate) fn apply_winch(&mut self, speed: f64) -> f64 {
        self.service_clutch();
        let speed = if !speed.is_finite() || self.cooling_down() {
            0.0
        } else if speed > 0.0 && !self.manual_override && self.at_loading_position() {
            0.0
        } else {
            speed.clamp(-1.0, 1.0)
        };
        self.winch.set(speed);
        speed
    }

    /// One step of the background task.
    pub(crate) fn poll(&mut self) {
        self.service_clutch();
        let Some(job) = self.job else {
            return;
        };

        match job {
            WinchJob::ReloadAfterFire => {
                if self.clutch_engaged {
                    self.job = Some(WinchJob::Reload);
                    self.step_reload();
                }
            }
            WinchJob::Reload => self.step_reload(),
            WinchJob::Bump { speed, remaining } => {
                if remaining == 0 {
                    self.winch.set(0.0);
                    self.job = None;
                } else {
                    self.apply_winch(speed);
                    self.job = Some(WinchJob::Bump {
                        speed,
                        remaining: remaining - 1,
                    });
                }
            }
        }
    }

    fn step_reload(&mut self) {
        if self.at_loading_position() {
            log::debug!("reload complete");
            self.winch.set(0.0);
            self.job = None;
            self.manual_control = true;
        } else {
            self.apply_winch(RELOAD_SPEED);
        }
    }
}

pub(crate) type SharedWinch = Arc<Mutex<WinchCore>>;

pub(crate) fn lock(core: &Mutex<WinchCore>) -> MutexGuard<'_, WinchCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the background winch work.
#[derive(Clone)]
pub struct WinchTask {
    core: SharedWinch,
}

impl WinchTask {
    pub(crate) fn new(core: SharedWinch) -> Self {
        WinchTask { core }
    }

    /// Runs one step: clutch re-engagement, then the pending job, if any.
    pub fn poll(&self) {
        lock(&self.core).poll();
    }

    /// The job still pending, if any.
    pub fn pending(&self) -> Option<WinchJob> {
        lock(&self.core).job()
    }
}

/// Thread polling a [`WinchTask`] at a fixed period. Stops and joins on drop.
pub struct WinchWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl WinchWorker {
    /// Starts polling `task` every `period`.
    pub fn spawn(task: WinchTask, period: Duration) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("winch".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Acquire) {
                    task.poll();
                    thread::sleep(period);
                }
            })?;
        log::debug!("winch worker started at {:?}", period);
        Ok(WinchWorker {
            stop,
            handle: Some(handle),
        })
    }

    /// Stops the thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("winch worker panicked");
            }
        }
    }
}

impl Drop for WinchWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::*;
    use crate::test_utils::*;
    use crate::timer::ManualClock;

    struct Rig {
        clock: ManualClock,
        winch: SimMotor,
        clutch: SimSolenoid,
        load: SimSwitch,
        pot: SimPotentiometer,
        core: WinchCore,
    }

    fn rig() -> Rig {
        let clock = ManualClock::new();
        let winch = SimMotor::new();
        let clutch = SimSolenoid::new();
        let load = SimSwitch::new();
        let pot = SimPotentiometer::new();
        let core = WinchCore::new(
            Box::new(winch.clone()),
            Box::new(clutch.clone()),
            Box::new(load.clone()),
            Box::new(SimSwitch::new()),
            Box::new(pot.clone()),
            4.5,
            clock.shared(),
        );
        Rig {
            clock,
            winch,
            clutch,
            load,
            pot,
            core,
        }
    }

    /// Test that the clutch starts engaged and the gate is open.
    #[test]
    fn test_winch_starts_engaged() {
        let mut rig = rig();
        assert!(rig.clutch.is_on());
        assert!(value_close(0.5, rig.core.apply_winch(0.5)));
        assert!(value_close(0.5, rig.winch.speed()));
    }

    /// Test that a bump runs for a fixed number of polls.
    #[test]
    fn test_winch_bump_tick_count() {
        let mut rig = rig();
        rig.core.start_job(WinchJob::Bump {
            speed: -BUMP_SPEED,
            remaining: BUMP_TICKS,
        });
        for _ in 0..BUMP_TICKS {
            rig.core.poll();
            assert!(value_close(-BUMP_SPEED, rig.winch.speed()));
        }
        rig.core.poll();
        assert!(value_close(0.0, rig.winch.speed()), "Bump should stop after its ticks.");
        assert_eq!(None, rig.core.job());
    }

    /// Test that a reload waits out the cooldown, then drives until loaded.
    #[test]
    fn test_winch_reload_after_fire() {
        let mut rig = rig();
        rig.core.manual_control = false;
        rig.core.release_clutch(1000.0);
        rig.core.start_job(WinchJob::ReloadAfterFire);
        assert!(!rig.clutch.is_on());

        rig.clock.advance_ms(500);
        rig.core.poll();
        assert!(value_close(0.0, rig.winch.speed()), "No motion during cooldown.");

        rig.clock.advance_ms(500);
        rig.core.poll();
        assert!(rig.clutch.is_on(), "Clutch re-engages after the cooldown.");
        assert!(value_close(RELOAD_SPEED, rig.winch.speed()));

        rig.pot.set_voltage(4.6);
        rig.core.poll();
        assert!(value_close(0.0, rig.winch.speed()), "Pot threshold counts as loaded.");
        assert_eq!(None, rig.core.job());
        assert!(rig.core.manual_control, "Reload hands back manual control.");
    }

    /// Test the loading position gate and its manual override.
    #[test]
    fn test_winch_loading_gate() {
        let mut rig = rig();
        rig.load.set(true);
        assert!(value_close(0.0, rig.core.apply_winch(0.8)));
        assert!(value_close(-0.8, rig.core.apply_winch(-0.8)), "Moving away stays allowed.");

        rig.core.manual_override = true;
        assert!(value_close(0.8, rig.core.apply_winch(0.8)));
    }

    /// Test that the worker thread polls the task until stopped.
    #[test]
    fn test_winch_worker_polls() {
        let rig = rig();
        let winch = rig.winch.clone();
        let core = Arc::new(Mutex::new(rig.core));
        lock(&core).start_job(WinchJob::Bump {
            speed: BUMP_SPEED,
            remaining: 2,
        });
        let task = WinchTask::new(Arc::clone(&core));
        let worker = WinchWorker::spawn(task.clone(), Duration::from_millis(1))
            .expect("worker should spawn");

        for _ in 0..1000 {
            if task.pending().is_none() {
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
        worker.stop();
        assert_eq!(None, task.pending());
        assert!(value_close(0.0, winch.speed()));
        assert_eq!(3, winch.writes());
    }
}
