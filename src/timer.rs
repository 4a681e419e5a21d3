// src/timer.rs

//! # Iterative Timing Module
//!
//! Elapsed-time measurement and one-shot expiration checks for code that runs
//! inside a periodic control loop. Nothing here sleeps; callers poll
//! [`Timer::has_expired`] once per tick.
//!
//! Time is read through the [`Clock`] trait so the same controllers can run
//! against the wall clock on the robot and against a [`ManualClock`] in tests
//! and simulations.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Time since an arbitrary, fixed origin. Never decreases.
    fn now(&self) -> Duration;
}

/// Shared handle to a clock. Every controller of one robot reads the same one.
pub type SharedClock = Arc<dyn Clock>;

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is the moment of construction.
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }

    /// Creates a shared handle to a new wall clock.
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven clock for tests and simulations.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the controllers under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward by `dt`.
    pub fn advance(&self, dt: Duration) {
        let step = u64::try_from(dt.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(step, Ordering::SeqCst);
    }

    /// Moves time forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Returns a shared handle reading this clock.
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Elapsed-time and expiration timer.
///
/// `elapsed()` is `now - start`, saturating at zero. A freshly created timer
/// has no expiration and therefore reports expired.
#[derive(Debug, Clone)]
pub struct Timer {
    clock: SharedClock,
    start: Duration,
    expiration: Duration,
}

impl Timer {
    /// Creates a timer anchored at the current time.
    pub fn new(clock: SharedClock) -> Self {
        let start = clock.now();
        Timer {
            clock,
            start,
            expiration: Duration::ZERO,
        }
    }

    /// Re-anchors the start time at now.
    pub fn reset(&mut self) {
        self.start = self.clock.now();
    }

    /// Resets the timer and sets its expiration. Zero means already expired.
    pub fn set_expiration(&mut self, expiration: Duration) {
        self.reset();
        self.expiration = expiration;
    }

    /// Millisecond form of [`Timer::set_expiration`]. Negative or non-finite
    /// values are treated as zero, values too large for a [`Duration`]
    /// saturate.
    pub fn set_expiration_ms(&mut self, ms: f64) {
        let ms = if ms.is_finite() { ms.max(0.0) } else { 0.0 };
        let expiration = Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX);
        self.set_expiration(expiration);
    }

    /// Time since the last reset.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.start)
    }

    /// Time since the last reset, in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    /// The currently configured expiration.
    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// `true` once `elapsed() >= expiration`.
    pub fn has_expired(&self) -> bool {
        self.elapsed() >= self.expiration
    }

    /// The clock this timer reads.
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }
}
