// src/robot.rs

//! # Robot Mode Driver
//!
//! Owns every subsystem and dispatches the four robot modes. The external
//! scheduler calls [`Robot::on_enter`] on a mode change and
//! [`Robot::on_tick`] once per control period.

use crate::autonomous::{select_mode, AutonomousMode, AutonomousSettings, Subsystems};
use crate::drivetrain::{Drivetrain, DrivetrainIo};
use crate::hal::{Dashboard, VisionSignal};
use crate::params::{ConstantsSource, Param, ParamError, ParameterStore, ReloadReport, Tunable};
use crate::pickup::{Pickup, PickupIo};
use crate::shooter::{Shooter, ShooterIo, WinchTask, WinchWorker};
use crate::teleop::{DriveScheme, DriverInputs, OperatorInputs, TeleopControl};
use crate::timer::SharedClock;
use std::fmt;
use std::io;
use std::time::Duration;

/// Operating mode requested by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotMode {
    /// Outputs parked, sensors may be recalibrated.
    #[default]
    Disabled,
    /// Running the selected routine.
    Autonomous,
    /// Driven from the driver station.
    Teleop,
    /// Outputs parked, telemetry only.
    Test,
}

impl fmt::Display for RobotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Hardware for the whole robot.
pub struct RobotIo {
    /// Drive base hardware.
    pub drivetrain: DrivetrainIo,
    /// Shooter hardware.
    pub shooter: ShooterIo,
    /// Pickup hardware.
    pub pickup: PickupIo,
    /// Hot goal signal.
    pub vision: Box<dyn VisionSignal>,
}

/// The robot program.
pub struct Robot {
    subsystems: Subsystems,
    params: ParameterStore,
    constants: Box<dyn ConstantsSource>,
    dashboard: Box<dyn Dashboard>,
    clock: SharedClock,
    teleop: TeleopControl,
    autonomous: Option<Box<dyn AutonomousMode>>,
    selector: i64,
    mode: RobotMode,
    loop_count: u32,
    previous_driver: DriverInputs,
    winch_task: WinchTask,
    winch_worker: Option<WinchWorker>,
}

impl Robot {
    /// Loads constants, builds and initializes every subsystem.
    ///
    /// An unreadable constants source is logged and the defaults are used.
    pub fn new(
        io: RobotIo,
        constants: Box<dyn ConstantsSource>,
        dashboard: Box<dyn Dashboard>,
        clock: SharedClock,
    ) -> Self {
        let mut params = ParameterStore::new();
        if let Err(err) = params.reload_and_notify(&*constants, &mut []) {
            log::warn!("starting with default constants: {}", err);
        }

        let mut drivetrain = Drivetrain::new(io.drivetrain, &params, clock.clone());
        drivetrain.init();
        let shooter = Shooter::new(io.shooter, &params, clock.clone());
        let winch_task = shooter.winch_task();
        let subsystems = Subsystems {
            drivetrain,
            shooter,
            pickup: Pickup::new(io.pickup),
            vision: io.vision,
        };
        let teleop = TeleopControl::new(DriveScheme::default(), &params);
        log::info!("robot initialization complete");

        Robot {
            subsystems,
            params,
            constants,
            dashboard,
            clock,
            teleop,
            autonomous: None,
            selector: 0,
            mode: RobotMode::Disabled,
            loop_count: 0,
            previous_driver: DriverInputs::default(),
            winch_task,
            winch_worker: None,
        }
    }

    /// Moves the winch task onto its own thread. Until this is called the
    /// task is polled once per tick.
    pub fn start_winch_worker(&mut self, period: Duration) -> io::Result<()> {
        if self.winch_worker.is_none() {
            self.winch_worker = Some(WinchWorker::spawn(self.winch_task.clone(), period)?);
        }
        Ok(())
    }

    /// Sets the routine picked on the next autonomous entry.
    pub fn set_autonomous_selector(&mut self, selector: i64) {
        self.selector = selector;
    }

    /// Sets the teleop drive scheme.
    pub fn set_drive_scheme(&mut self, scheme: DriveScheme) {
        self.teleop.set_scheme(scheme);
    }

    /// Current mode.
    pub fn mode(&self) -> RobotMode {
        self.mode
    }

    /// The subsystems.
    pub fn subsystems(&self) -> &Subsystems {
        &self.subsystems
    }

    /// The subsystems, mutably.
    pub fn subsystems_mut(&mut self) -> &mut Subsystems {
        &mut self.subsystems
    }

    /// Current parameter values.
    pub fn params(&self) -> &ParameterStore {
        &self.params
    }

    /// Name of the routine selected for this autonomous period, if any.
    pub fn autonomous_name(&self) -> Option<&'static str> {
        self.autonomous.as_ref().map(|mode| mode.name())
    }

    /// Re-reads the constants source and notifies every tunable subsystem.
    pub fn reload_constants(&mut self) -> Result<ReloadReport, ParamError> {
        let mut dependents: [&mut dyn Tunable; 3] = [
            &mut self.subsystems.drivetrain,
            &mut self.subsystems.shooter,
            &mut self.teleop,
        ];
        let report = self
            .params
            .reload_and_notify(&*self.constants, &mut dependents)?;
        log::info!("reloaded {} constants", report.updated.len());
        Ok(report)
    }

    /// Enters `mode`.
    pub fn on_enter(&mut self, mode: RobotMode) {
        log::info!("entering {} mode", mode);
        self.mode = mode;
        self.loop_count = 0;

        match mode {
            RobotMode::Disabled => {
                self.autonomous = None;
                // Failures are already logged by the store
                let _ = self.reload_constants();
                self.park();
            }
            RobotMode::Autonomous => {
                let settings = AutonomousSettings::from_params(&self.params);
                let mut routine = select_mode(self.selector, settings, self.clock.clone());
                routine.init(&mut self.subsystems);
                self.autonomous = Some(routine);
            }
            RobotMode::Teleop => {
                self.autonomous = None;
                self.teleop.init(&mut self.subsystems);
            }
            RobotMode::Test => {
                self.autonomous = None;
                self.park();
            }
        }
    }

    /// Runs one control period of the current mode.
    pub fn on_tick(&mut self, inputs: &OperatorInputs) {
        match self.mode {
            RobotMode::Disabled => self.disabled_tick(&inputs.driver),
            RobotMode::Autonomous => {
                if let Some(routine) = self.autonomous.as_mut() {
                    routine.run(&mut self.subsystems);
                }
            }
            RobotMode::Teleop => self.teleop.run(&mut self.subsystems, inputs),
            RobotMode::Test => {}
        }
        self.previous_driver = inputs.driver;

        if self.winch_worker.is_none() {
            self.winch_task.poll();
        }
        self.update_dashboard();
    }

    fn disabled_tick(&mut self, driver: &DriverInputs) {
        let before = self.previous_driver;
        if driver.button_a && !before.button_a {
            self.subsystems.drivetrain.reinit_gyro();
        }
        if driver.button_b && !before.button_b {
            log::info!("zeroing encoders");
            self.subsystems.drivetrain.reset_encoders();
        }
        if driver.button_x && !before.button_x {
            let _ = self.reload_constants();
        }
    }

    fn park(&mut self) {
        let robot = &mut self.subsystems;
        robot.drivetrain.arcade_drive(0.0, 0.0);
        robot.shooter.set_winch(0.0);
        robot.pickup.stop_rollers();
        robot.vision.set_enabled(false);
    }

    fn update_dashboard(&mut self) {
        let period = self.params.get(Param::DashboardUpdateFrequency);
        self.loop_count = self.loop_count.saturating_add(1);
        if f64::from(self.loop_count) >= period {
            let robot = &self.subsystems;
            robot.drivetrain.update_dashboard(self.dashboard.as_mut());
            robot.shooter.update_dashboard(self.dashboard.as_mut());
            robot.pickup.update_dashboard(self.dashboard.as_mut());
            self.loop_count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ConstantsFile;
    use crate::sim::SimDashboard;
    use crate::test_utils::*;
    use crate::timer::ManualClock;

    /// Test that disabled entry reloads constants into the subsystems.
    #[test]
    fn test_robot_disabled_reloads_constants() {
        let (mut robot, rig) = robot_rig("ShooterP=4.0\n");
        assert!(value_close(4.0, robot.subsystems().shooter.position_gains().kp));

        rig.constants.replace("ShooterP=5.0\nDrivetrainAngleP=0.1\n");
        robot.on_enter(RobotMode::Disabled);
        assert!(value_close(5.0, robot.subsystems().shooter.position_gains().kp));
        assert!(value_close(0.1, robot.subsystems().drivetrain.gains().angle.kp));
    }

    /// Test the disabled buttons on their press edges.
    #[test]
    fn test_robot_disabled_buttons() {
        let (mut robot, rig) = robot_rig("");
        robot.on_enter(RobotMode::Disabled);
        let mut inputs = OperatorInputs::default();
        inputs.driver.button_a = true;
        inputs.driver.button_b = true;
        robot.on_tick(&inputs);
        robot.on_tick(&inputs);

        assert_eq!(1, rig.io.drive.gyro.reinits());
        // One reset from init, one from the button
        assert_eq!(2, rig.io.drive.left.resets());
    }

    /// Test autonomous selection and that the routine runs on ticks.
    #[test]
    fn test_robot_autonomous_mode() {
        let (mut robot, rig) = robot_rig("");
        robot.set_autonomous_selector(3);
        robot.on_enter(RobotMode::Autonomous);
        assert_eq!(Some("LowGoalAutonomous"), robot.autonomous_name());

        robot.on_tick(&OperatorInputs::default());
        assert!(value_close(0.75, rig.io.drive.drive.left()));

        robot.on_enter(RobotMode::Teleop);
        assert_eq!(None, robot.autonomous_name());
        robot.on_tick(&OperatorInputs::default());
        assert!(value_close(0.0, rig.io.drive.drive.left()));
    }

    /// Test that the winch task is polled inline without a worker.
    #[test]
    fn test_robot_polls_winch_task() {
        let (mut robot, rig) = robot_rig("");
        robot.on_enter(RobotMode::Teleop);
        let mut inputs = OperatorInputs::default();
        inputs.operator.reload = true;
        robot.on_tick(&inputs);
        assert!(value_close(1.0, rig.io.shooter.winch.speed()));
    }

    /// Test that the dashboard publishes once every period ticks.
    #[test]
    fn test_robot_dashboard_cadence() {
        let (mut robot, rig) = robot_rig("DashboardUpdateFrequency=3\n");
        robot.on_enter(RobotMode::Test);
        let inputs = OperatorInputs::default();
        robot.on_tick(&inputs);
        robot.on_tick(&inputs);
        assert_eq!(0, rig.dashboard.publishes(), "Nothing before the third tick.");

        robot.on_tick(&inputs);
        let per_publish = rig.dashboard.publishes();
        assert!(per_publish > 0);
        assert_eq!(Some(false), rig.dashboard.flag("High Gear"));

        for _ in 0..6 {
            robot.on_tick(&inputs);
        }
        assert_eq!(3 * per_publish, rig.dashboard.publishes());
    }

    /// Test that an oversized clutch reset time holds the clutch open.
    #[test]
    fn test_robot_fire_with_huge_reset_time() {
        let (mut robot, rig) = robot_rig("ShooterResetTime=1e300\n");
        rig.io.shooter.ball.set(true);
        robot.on_enter(RobotMode::Teleop);
        let mut inputs = OperatorInputs::default();
        inputs.operator.fire = true;
        robot.on_tick(&inputs);
        assert!(!rig.io.shooter.clutch.is_on(), "Clutch should be released.");

        rig.io.clock.advance_ms(60_000);
        robot.on_tick(&OperatorInputs::default());
        assert!(!rig.io.shooter.clutch.is_on(), "Cooldown should not run out.");
    }

    /// Test that autonomous intake rollers stop once teleop idles.
    #[test]
    fn test_robot_teleop_stops_autonomous_rollers() {
        let (mut robot, rig) = robot_rig("");
        robot.set_autonomous_selector(4);
        robot.on_enter(RobotMode::Autonomous);
        robot.on_tick(&OperatorInputs::default());
        assert!(rig.io.pickup.roller.speed() != 0.0);

        robot.on_enter(RobotMode::Teleop);
        robot.on_tick(&OperatorInputs::default());
        assert!(value_close(0.0, rig.io.pickup.roller.speed()));
    }

    /// Test that a missing constants source falls back to defaults.
    #[test]
    fn test_robot_missing_constants() {
        let clock = ManualClock::new();
        let (io, _rig) = robot_io(&clock);
        let robot = Robot::new(
            io,
            Box::new(ConstantsFile::new("/nonexistent/Constants.txt")),
            Box::new(SimDashboard::new()),
            clock.shared(),
        );
        assert!(value_close(
            Param::ShooterP.default_value(),
            robot.params().get(Param::ShooterP)
        ));
    }
}
