// src/sim.rs

//! # Simulated Devices
//!
//! In-memory implementations of every [`crate::hal`] trait. Each device is a
//! cheap handle around shared state: clone it, give one clone to a
//! controller and keep the other to poke inputs and inspect outputs.

use crate::hal::{
    Dashboard, DigitalInput, DoubleSolenoid, DriveOutputs, Encoder, Gyro, MotorOutput,
    Potentiometer, RangeFinder, Solenoid, SolenoidDirection, VisionSignal,
};
use crate::params::{ConstantsSource, ParamError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, copyable value.
#[derive(Debug, Default)]
pub struct SimCell<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for SimCell<T> {
    fn clone(&self) -> Self {
        SimCell {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Copy> SimCell<T> {
    /// Creates a cell holding `value`.
    pub fn new(value: T) -> Self {
        SimCell {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        *lock(&self.inner)
    }

    /// Replaces the value.
    pub fn set(&self, value: T) {
        *lock(&self.inner) = value;
    }

    /// Applies `f` to the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut lock(&self.inner));
    }
}

/// Simulated motor controller. Remembers the last command and how many were sent.
#[derive(Debug, Clone, Default)]
pub struct SimMotor {
    speed: SimCell<f64>,
    writes: SimCell<usize>,
}

impl SimMotor {
    /// Creates a stopped motor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last commanded speed.
    pub fn speed(&self) -> f64 {
        self.speed.get()
    }

    /// Number of commands received.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl MotorOutput for SimMotor {
    fn set(&mut self, speed: f64) {
        self.speed.set(speed);
        self.writes.update(|count| *count += 1);
    }
}

/// Simulated pair of drive sides with a watchdog flag.
#[derive(Debug, Clone, Default)]
pub struct SimDrive {
    left: SimCell<f64>,
    right: SimCell<f64>,
    safety: SimCell<bool>,
}

impl SimDrive {
    /// Creates a stopped drive with the watchdog disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last left command.
    pub fn left(&self) -> f64 {
        self.left.get()
    }

    /// Last right command.
    pub fn right(&self) -> f64 {
        self.right.get()
    }

    /// Whether the watchdog is enabled.
    pub fn safety_enabled(&self) -> bool {
        self.safety.get()
    }
}

impl DriveOutputs for SimDrive {
    fn set_left_right(&mut self, left: f64, right: f64) {
        self.left.set(left);
        self.right.set(right);
    }

    fn set_safety_enabled(&mut self, enabled: bool) {
        self.safety.set(enabled);
    }
}

/// Simulated encoder.
#[derive(Debug, Clone, Default)]
pub struct SimEncoder {
    count: SimCell<i32>,
    resets: SimCell<usize>,
}

impl SimEncoder {
    /// Creates an encoder at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the count.
    pub fn set(&self, ticks: i32) {
        self.count.set(ticks);
    }

    /// Number of resets received.
    pub fn resets(&self) -> usize {
        self.resets.get()
    }
}

impl Encoder for SimEncoder {
    fn get(&self) -> i32 {
        self.count.get()
    }

    fn reset(&mut self) {
        self.count.set(0);
        self.resets.update(|count| *count += 1);
    }
}

/// Simulated gyro.
#[derive(Debug, Clone, Default)]
pub struct SimGyro {
    angle: SimCell<f64>,
    sensitivity: SimCell<f64>,
    reinits: SimCell<usize>,
}

impl SimGyro {
    /// Creates a gyro at zero heading.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the heading.
    pub fn set_angle(&self, degrees: f64) {
        self.angle.set(degrees);
    }

    /// Last configured sensitivity.
    pub fn sensitivity(&self) -> f64 {
        self.sensitivity.get()
    }

    /// Number of full recalibrations.
    pub fn reinits(&self) -> usize {
        self.reinits.get()
    }
}

impl Gyro for SimGyro {
    fn angle(&self) -> f64 {
        self.angle.get()
    }

    fn reset(&mut self) {
        self.angle.set(0.0);
    }

    fn set_sensitivity(&mut self, volts_per_degree_per_second: f64) {
        self.sensitivity.set(volts_per_degree_per_second);
    }

    fn reinit(&mut self) {
        self.angle.set(0.0);
        self.reinits.update(|count| *count += 1);
    }
}

/// Simulated ultrasonic range finder.
#[derive(Debug, Clone, Default)]
pub struct SimRangeFinder {
    inches: SimCell<f64>,
}

impl SimRangeFinder {
    /// Creates a sensor reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the reading.
    pub fn set_range(&self, inches: f64) {
        self.inches.set(inches);
    }
}

impl RangeFinder for SimRangeFinder {
    fn range_inches(&self) -> f64 {
        self.inches.get()
    }
}

/// Simulated digital input.
#[derive(Debug, Clone, Default)]
pub struct SimSwitch {
    state: SimCell<bool>,
}

impl SimSwitch {
    /// Creates an input reading `false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the input.
    pub fn set(&self, state: bool) {
        self.state.set(state);
    }
}

impl DigitalInput for SimSwitch {
    fn get(&self) -> bool {
        self.state.get()
    }
}

/// Simulated potentiometer.
#[derive(Debug, Clone, Default)]
pub struct SimPotentiometer {
    volts: SimCell<f64>,
}

impl SimPotentiometer {
    /// Creates a potentiometer reading zero volts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the reading.
    pub fn set_voltage(&self, volts: f64) {
        self.volts.set(volts);
    }
}

impl Potentiometer for SimPotentiometer {
    fn average_voltage(&self) -> f64 {
        self.volts.get()
    }
}

/// Simulated single-acting solenoid.
#[derive(Debug, Clone, Default)]
pub struct SimSolenoid {
    on: SimCell<bool>,
}

impl SimSolenoid {
    /// Creates a released solenoid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the solenoid is energized.
    pub fn is_on(&self) -> bool {
        self.on.get()
    }
}

impl Solenoid for SimSolenoid {
    fn set(&mut self, on: bool) {
        self.on.set(on);
    }
}

/// Simulated double-acting solenoid.
#[derive(Debug, Clone, Default)]
pub struct SimDoubleSolenoid {
    direction: SimCell<SolenoidDirection>,
}

impl SimDoubleSolenoid {
    /// Creates a solenoid with both coils off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last commanded direction.
    pub fn direction(&self) -> SolenoidDirection {
        self.direction.get()
    }
}

impl DoubleSolenoid for SimDoubleSolenoid {
    fn set(&mut self, direction: SolenoidDirection) {
        self.direction.set(direction);
    }

    fn get(&self) -> SolenoidDirection {
        self.direction.get()
    }
}

/// Simulated vision signal.
#[derive(Debug, Clone, Default)]
pub struct SimVision {
    hot: SimCell<bool>,
    enabled: SimCell<bool>,
}

impl SimVision {
    /// Creates a signal reporting a cold goal with processing disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces the hot-goal signal.
    pub fn set_hot(&self, hot: bool) {
        self.hot.set(hot);
    }

    /// Whether processing was last requested.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl VisionSignal for SimVision {
    fn goal_is_hot(&self) -> bool {
        self.hot.get()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled.set(enabled);
    }
}

/// Dashboard that records the latest published values.
#[derive(Debug, Clone, Default)]
pub struct SimDashboard {
    numbers: Arc<Mutex<HashMap<String, f64>>>,
    flags: Arc<Mutex<HashMap<String, bool>>>,
    publishes: SimCell<usize>,
}

impl SimDashboard {
    /// Creates an empty dashboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest number published under `key`.
    pub fn number(&self, key: &str) -> Option<f64> {
        lock(&self.numbers).get(key).copied()
    }

    /// Latest flag published under `key`.
    pub fn flag(&self, key: &str) -> Option<bool> {
        lock(&self.flags).get(key).copied()
    }

    /// Total values published.
    pub fn publishes(&self) -> usize {
        self.publishes.get()
    }
}

impl Dashboard for SimDashboard {
    fn put_number(&mut self, key: &str, value: f64) {
        lock(&self.numbers).insert(key.to_string(), value);
        self.publishes.update(|count| *count += 1);
    }

    fn put_bool(&mut self, key: &str, value: bool) {
        lock(&self.flags).insert(key.to_string(), value);
        self.publishes.update(|count| *count += 1);
    }
}

/// Constants text that can be edited while the robot holds a reader.
#[derive(Debug, Clone, Default)]
pub struct SimConstants {
    text: Arc<Mutex<String>>,
}

impl SimConstants {
    /// Creates a source holding `text`.
    pub fn new(text: impl Into<String>) -> Self {
        SimConstants {
            text: Arc::new(Mutex::new(text.into())),
        }
    }

    /// Replaces the text returned by the next load.
    pub fn replace(&self, text: impl Into<String>) {
        *lock(&self.text) = text.into();
    }
}

impl ConstantsSource for SimConstants {
    fn load(&self) -> Result<String, ParamError> {
        Ok(lock(&self.text).clone())
    }
}
