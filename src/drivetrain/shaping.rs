// src/drivetrain/shaping.rs

//! # Drive Shaping Functions
//!
//! Pure mixing functions turning a throttle and a turn command into left and
//! right side outputs.

use num_traits::{Float, FloatConst};

/// Tunables for [`cheesy_mix`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheesyConfig<T> {
    /// Turn multiplier per unit of throttle above the quick-turn threshold.
    pub turn_gain: T,
    /// Throttle magnitude above which the turn gain applies.
    pub quick_turn_threshold: T,
    /// Fraction of one side's saturation overflow taken off the other side.
    pub skim_gain: T,
    /// Sine curve shape, in `(0, 1]`. Non-positive disables shaping.
    pub wheel_non_linearity: T,
}

/// Clamps `value` to `[-1, 1]`.
pub fn clamp_unit<T: Float>(value: T) -> T {
    value.max(-T::one()).min(T::one())
}

/// Direct differential mixing. Positive turn is clockwise.
pub fn arcade_mix<T: Float>(move_value: T, turn: T) -> (T, T) {
    let move_value = clamp_unit(move_value);
    let turn = clamp_unit(turn);
    (clamp_unit(move_value + turn), clamp_unit(move_value - turn))
}

/// Sine-based turn curve, applied twice. Keeps `-1`, `0` and `1` fixed and
/// softens the response around the center.
pub fn shape_turn<T: Float + FloatConst>(turn: T, non_linearity: T) -> T {
    if non_linearity <= T::zero() {
        return turn;
    }
    let non_linearity = non_linearity.min(T::one());
    let scale = T::FRAC_PI_2() * non_linearity;
    let denominator = scale.sin();
    let first = (scale * turn).sin() / denominator;
    (scale * first).sin() / denominator
}

/// Overflow of `value` past `[-1, 1]`, negated and scaled by `gain`.
pub fn skim<T: Float>(value: T, gain: T) -> T {
    let one = T::one();
    if value > one {
        -((value - one) * gain)
    } else if value < -one {
        -((value + one) * gain)
    } else {
        T::zero()
    }
}

/// Cheesy drive mixing with saturation skimming.
///
/// The raw sides are `throttle + turn` and `throttle - turn`. When one side
/// passes full scale, its overflow times the skim gain is removed from the
/// other side before both are clamped, which keeps the intended turn radius
/// while the motors saturate.
pub fn cheesy_mix<T: Float + FloatConst>(throttle: T, turn: T, config: CheesyConfig<T>) -> (T, T) {
    let throttle = clamp_unit(throttle);
    let mut turn = shape_turn(clamp_unit(turn), config.wheel_non_linearity);

    if throttle.abs() > config.quick_turn_threshold {
        turn = turn * (config.turn_gain * throttle.abs());
    }

    let raw_left = throttle + turn;
    let raw_right = throttle - turn;
    let left = raw_left + skim(raw_right, config.skim_gain);
    let right = raw_right + skim(raw_left, config.skim_gain);

    (clamp_unit(left), clamp_unit(right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn config(skim_gain: f64) -> CheesyConfig<f64> {
        CheesyConfig {
            turn_gain: 1.5,
            quick_turn_threshold: 0.5,
            skim_gain,
            wheel_non_linearity: 0.5,
        }
    }

    /// Test arcade mixing and its clamping.
    #[test]
    fn test_shaping_arcade_mix() {
        let (left, right) = arcade_mix(0.5, 0.25);
        assert!(value_close(0.75, left));
        assert!(value_close(0.25, right));

        let (left, right) = arcade_mix(3.0, 0.5);
        assert!(value_close(1.0, left), "Left should clamp to 1.");
        assert!(value_close(0.5, right), "Inputs should clamp before mixing.");
    }

    /// Test that the turn curve keeps its fixed points and symmetry.
    #[test]
    fn test_shaping_turn_curve_fixed_points() {
        for non_linearity in [0.1, 0.5, 0.9, 1.0] {
            assert!(value_close(1.0, shape_turn(1.0, non_linearity)));
            assert!(value_close(-1.0, shape_turn(-1.0, non_linearity)));
            assert!(value_close(0.0, shape_turn(0.0, non_linearity)));
            let positive = shape_turn(0.3, non_linearity);
            assert!(value_close(-positive, shape_turn(-0.3, non_linearity)));
        }
        assert!(value_close(0.3, shape_turn(0.3, 0.0)), "Zero shape is identity.");
    }

    /// Test the skim function on both sides of full scale.
    #[test]
    fn test_shaping_skim() {
        assert!(value_close(0.0, skim(0.9, 0.5)));
        assert!(value_close(-0.1, skim(1.2, 0.5)));
        assert!(value_close(0.1, skim(-1.2, 0.5)));
    }

    /// Test that a saturated side clamps to 1 and the other loses gain times the overflow.
    #[test]
    fn test_shaping_skim_conservation() {
        for skim_gain in [0.0, 0.25, 0.5, 1.0] {
            // Throttle below the quick-turn threshold, full turn: raw sides 1.4 and -0.6.
            let (left, right) = cheesy_mix(0.4, 1.0, config(skim_gain));
            assert!(value_close(1.0, left), "Saturated side should clamp to exactly 1.");
            assert!(
                value_close(-0.6 - skim_gain * 0.4, right),
                "Opposite side should drop by skim gain times overflow."
            );

            // Reversed throttle: raw sides 0.6 and -1.4.
            let (left, right) = cheesy_mix(-0.4, 1.0, config(skim_gain));
            assert!(value_close(-1.0, right), "Saturated side should clamp to exactly -1.");
            assert!(
                value_close(0.6 + skim_gain * 0.4, left),
                "Opposite side should rise by skim gain times overflow."
            );
        }
    }

    /// Test the quick-turn gain above the throttle threshold.
    #[test]
    fn test_shaping_quick_turn_gain() {
        let no_skim = config(0.0);
        let turn = shape_turn(0.2, no_skim.wheel_non_linearity);
        let (left, right) = cheesy_mix(0.8, 0.2, no_skim);
        let boosted = turn * 1.5 * 0.8;
        assert!(value_close((0.8 + boosted).min(1.0), left));
        assert!(value_close(0.8 - boosted, right));
    }
}
