// src/shooter/aim.rs

//! # Auto-Aim Table
//!
//! Ordered distance to arm setpoint pairs with linear interpolation between
//! neighbours. Lookups outside the covered range clamp to the nearest end.

use num_traits::Float;

/// Distance in inches paired with a potentiometer setpoint in volts.
pub const DEFAULT_AIM_POINTS: [(f64, f64); 4] =
    [(72.0, 1.2), (96.0, 1.4), (120.0, 1.6), (168.0, 2.0)];

/// Sorted lookup table mapping distance to setpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AimTable<T> {
    points: Vec<(T, T)>,
}

impl<T: Float> AimTable<T> {
    /// Builds a table from `(distance, setpoint)` pairs in any order.
    /// Pairs with a non-finite component are dropped.
    pub fn new(points: impl IntoIterator<Item = (T, T)>) -> Self {
        let mut points: Vec<(T, T)> = points
            .into_iter()
            .filter(|(distance, setpoint)| distance.is_finite() && setpoint.is_finite())
            .collect();
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        AimTable { points }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Interpolated setpoint for `distance`, or `None` for an empty table.
    pub fn lookup(&self, distance: T) -> Option<T> {
        let (first, last) = (self.points.first()?, self.points.last()?);
        if distance.is_nan() {
            return None;
        }
        if distance <= first.0 {
            return Some(first.1);
        }
        if distance >= last.0 {
            return Some(last.1);
        }

        // First entry strictly beyond the distance; bounded to [1, len - 1] by the checks above.
        let upper = self.points.partition_point(|(d, _)| *d <= distance);
        let (d0, s0) = self.points[upper - 1];
        let (d1, s1) = self.points[upper];
        if d1 == d0 {
            return Some(s0);
        }
        Some(s0 + (s1 - s0) * (distance - d0) / (d1 - d0))
    }
}

impl Default for AimTable<f64> {
    fn default() -> Self {
        AimTable::new(DEFAULT_AIM_POINTS)
    }
}
