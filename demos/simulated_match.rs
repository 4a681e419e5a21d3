// demos/simulated_match.rs

use iterative_robot_core::drivetrain::DrivetrainIo;
use iterative_robot_core::params::ConstantsText;
use iterative_robot_core::pickup::PickupIo;
use iterative_robot_core::shooter::ShooterIo;
use iterative_robot_core::sim::*;
use iterative_robot_core::teleop::OperatorInputs;
use iterative_robot_core::timer::ManualClock;
use iterative_robot_core::{Robot, RobotIo, RobotMode};

const TICK_MS: u64 = 20;
const AUTONOMOUS_TICKS: u32 = 500;
const TELEOP_TICKS: u32 = 250;

// Encoder ticks per control period at full output.
const TICKS_PER_PERIOD: f64 = 400.0;
// Potentiometer volts per control period at full winch output.
const VOLTS_PER_PERIOD: f64 = 0.05;

struct Field {
    drive: SimDrive,
    left: SimEncoder,
    right: SimEncoder,
    winch: SimMotor,
    clutch: SimSolenoid,
    pot: SimPotentiometer,
    ball: SimSwitch,
    vision: SimVision,
    arm_volts: f64,
    left_ticks: f64,
    right_ticks: f64,
}

impl Field {
    // Crude plant: wheels integrate motor output, the arm springs forward
    // when the clutch lets go and is wound back by the winch.
    fn step(&mut self) {
        self.left_ticks += self.drive.left() * TICKS_PER_PERIOD;
        self.right_ticks += self.drive.right() * TICKS_PER_PERIOD;
        self.left.set(self.left_ticks as i32);
        self.right.set(self.right_ticks as i32);

        if self.clutch.is_on() {
            self.arm_volts = (self.arm_volts + self.winch.speed() * VOLTS_PER_PERIOD).clamp(0.0, 5.0);
        } else {
            self.arm_volts = 0.5;
            self.ball.set(false);
        }
        self.pot.set_voltage(self.arm_volts);
    }
}

fn main() {
    let selector = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0);

    let clock = ManualClock::new();
    let mut field = Field {
        drive: SimDrive::new(),
        left: SimEncoder::new(),
        right: SimEncoder::new(),
        winch: SimMotor::new(),
        clutch: SimSolenoid::new(),
        pot: SimPotentiometer::new(),
        ball: SimSwitch::new(),
        vision: SimVision::new(),
        arm_volts: 4.5,
        left_ticks: 0.0,
        right_ticks: 0.0,
    };
    field.ball.set(true);
    field.pot.set_voltage(field.arm_volts);
    let dashboard = SimDashboard::new();

    let io = RobotIo {
        drivetrain: DrivetrainIo {
            drive: Box::new(field.drive.clone()),
            shifter: Box::new(SimSolenoid::new()),
            catching_aid: Box::new(SimDoubleSolenoid::new()),
            left_encoder: Box::new(field.left.clone()),
            right_encoder: Box::new(field.right.clone()),
            gyro: Box::new(SimGyro::new()),
            range_finder: Box::new(SimRangeFinder::new()),
        },
        shooter: ShooterIo {
            winch: Box::new(field.winch.clone()),
            clutch: Box::new(field.clutch.clone()),
            load_switch: Box::new(SimSwitch::new()),
            max_switch: Box::new(SimSwitch::new()),
            potentiometer: Box::new(field.pot.clone()),
            ball_sensor: Box::new(field.ball.clone()),
        },
        pickup: PickupIo {
            roller: Box::new(SimMotor::new()),
            deploy: Box::new(SimDoubleSolenoid::new()),
            lowered_switch: Box::new(SimSwitch::new()),
        },
        vision: Box::new(field.vision.clone()),
    };

    // Publish telemetry twice a second.
    let constants = ConstantsText("DashboardUpdateFrequency=25\n".into());
    let mut robot = Robot::new(io, Box::new(constants), Box::new(dashboard.clone()), clock.shared());
    robot.set_autonomous_selector(selector);

    robot.on_enter(RobotMode::Disabled);
    robot.on_tick(&OperatorInputs::default());

    robot.on_enter(RobotMode::Autonomous);
    println!("Autonomous: {}", robot.autonomous_name().unwrap_or("none"));
    println!("    t (s),  Left,   Right,  Encoder,  Arm (V),  Clutch");
    let inputs = OperatorInputs::default();
    for tick in 0..AUTONOMOUS_TICKS {
        if tick == 150 {
            field.vision.set_hot(true);
        }
        robot.on_tick(&inputs);
        field.step();
        clock.advance_ms(TICK_MS);

        if tick % 25 == 0 {
            println!(
                "    {:-6.2}, {:-6.2}, {:-6.2}, {:-8.0}, {:-8.2}, {}",
                f64::from(tick) * TICK_MS as f64 / 1000.0,
                field.drive.left(),
                field.drive.right(),
                dashboard.number("LeftEncoder").unwrap_or(0.0),
                field.arm_volts,
                field.clutch.is_on(),
            );
        }
    }

    robot.on_enter(RobotMode::Teleop);
    let mut inputs = OperatorInputs::default();
    inputs.driver.left_y = -0.8;
    inputs.driver.right_x = 0.3;
    for _ in 0..TELEOP_TICKS {
        robot.on_tick(&inputs);
        field.step();
        clock.advance_ms(TICK_MS);
    }
    println!(
        "Teleop: left = {:.3}, right = {:.3}",
        field.drive.left(),
        field.drive.right()
    );

    robot.on_enter(RobotMode::Disabled);
    println!(
        "Disabled: left = {:.3}, right = {:.3}, dashboard writes = {}",
        field.drive.left(),
        field.drive.right(),
        dashboard.publishes()
    );
}
