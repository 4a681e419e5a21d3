// src/autonomous/sequence.rs

//! # Command Queue
//!
//! Runs a fixed list of commands one after another. Each tick the current
//! command is initialized if it has not been yet, run, then checked; a
//! finished command is ended and the next one becomes current. Once the
//! list is exhausted the sequence parks the robot on every tick.

use super::{
    park, prepare, AutonomousMode, AutonomousSettings, DriveStraight, Fire, Subsystems,
    WaitForHotGoal, WaitForReload,
};
use crate::timer::SharedClock;

/// Budget for the drive to the shooting spot, in milliseconds.
pub const DRIVE_TIMEOUT_MS: f64 = 3250.0;

/// Budget for the post-shot reload in the basic sequence, in milliseconds.
pub const SEQUENCE_RELOAD_TIMEOUT_MS: f64 = 5000.0;

/// One step of a [`CommandSequence`].
pub trait AutonomousCommand {
    /// Name used in logs.
    fn name(&self) -> &'static str;
    /// Called once, on the first tick the command is current.
    fn init(&mut self, robot: &mut Subsystems);
    /// Called every tick while the command is current.
    fn run(&mut self, robot: &mut Subsystems);
    /// Checked after every run.
    fn is_finished(&self, robot: &Subsystems) -> bool;
    /// Called once, after `is_finished` first returns `true`.
    fn end(&mut self, robot: &mut Subsystems);
}

/// Ordered queue of commands.
pub struct CommandSequence {
    name: &'static str,
    commands: Vec<Box<dyn AutonomousCommand>>,
    current: usize,
    initialized: bool,
    done: bool,
}

impl CommandSequence {
    /// Creates an empty sequence.
    pub fn new(name: &'static str) -> Self {
        CommandSequence {
            name,
            commands: Vec::new(),
            current: 0,
            initialized: false,
            done: false,
        }
    }

    /// Appends a command. The list is fixed once the sequence starts.
    pub fn with(mut self, command: impl AutonomousCommand + 'static) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    /// Index of the command currently executing.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// `true` when the sequence has no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Rewinds to the first command without touching the robot.
    pub fn restart(&mut self) {
        self.current = 0;
        self.initialized = false;
        self.done = self.commands.is_empty();
    }

    /// Advances the queue by one tick. Returns `true` once done.
    pub fn step(&mut self, robot: &mut Subsystems) -> bool {
        if self.done {
            return true;
        }
        let Some(command) = self.commands.get_mut(self.current) else {
            self.done = true;
            return true;
        };

        if !self.initialized {
            log::debug!("{}: starting {} ({})", self.name, command.name(), self.current);
            self.initialized = true;
            command.init(robot);
        }
        command.run(robot);
        if command.is_finished(robot) {
            command.end(robot);
            log::debug!("{}: finished {}", self.name, command.name());
            self.current += 1;
            self.initialized = false;
            if self.current >= self.commands.len() {
                log::debug!("{}: done", self.name);
                self.done = true;
            }
        }
        self.done
    }
}

impl AutonomousMode for CommandSequence {
    fn name(&self) -> &'static str {
        self.name
    }

    fn init(&mut self, robot: &mut Subsystems) {
        prepare(robot);
        self.restart();
    }

    fn run(&mut self, robot: &mut Subsystems) {
        if self.step(robot) {
            park(robot);
        }
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

/// Drive to the shooting spot, wait for the hot goal, fire, wait for reload.
pub fn basic_sequence(settings: AutonomousSettings, clock: SharedClock) -> CommandSequence {
    CommandSequence::new("BasicSequence")
        .with(DriveStraight::new(
            settings.drive_distance,
            DRIVE_TIMEOUT_MS,
            clock.clone(),
        ))
        .with(WaitForHotGoal::new(clock.clone()))
        .with(Fire)
        .with(WaitForReload::new(SEQUENCE_RELOAD_TIMEOUT_MS, clock))
}
