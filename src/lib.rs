// src/lib.rs

//! # Iterative Robot Control Core
//!
//! Closed-loop control for a competition robot with a two-speed drive base,
//! a winch-and-clutch ball launcher and a roller pickup. The crate holds the
//! per-tick logic only: an external scheduler owns the loop and calls
//! [`Robot::on_enter`] and [`Robot::on_tick`], while all hardware sits behind
//! the traits in [`hal`]. The [`sim`] module supplies in-memory devices for
//! tests and desktop runs.
//!
//! Controller gains and tuning offsets live in a `Name=value` constants file
//! that is re-read whenever the robot is disabled, see [`params`].

#![deny(missing_docs)]

pub mod autonomous;
pub mod drivetrain;
pub mod hal;
pub mod params;
pub mod pickup;
pub mod pid;
pub mod robot;
pub mod shooter;
pub mod sim;
pub mod teleop;
pub mod timer;

#[doc(inline)]
pub use robot::*;

#[cfg(test)]
mod test_utils;
