//! Gain Computer
//!
//! Static soft-knee compression curve. With `x = level - threshold`, knee
//! width `W` and slope `S = 1 - 1/ratio`:
//!
//! ```text
//! x <= -W/2        reduction = 0
//! x >=  W/2        reduction = S * x
//! otherwise        reduction = S * (x + W/2)^2 / (2W)
//! ```
//!
//! The quadratic segment meets both straight segments with matching value
//! and first derivative, so the curve has no audible elbow.

use crate::units::LEVEL_FLOOR_DB;

/// Ratio at (or above) which the curve becomes a brickwall limiter
pub const LIMIT_RATIO: f32 = 100.0;

/// Threshold offset applied by the compress macro at 100%
pub const COMPRESS_THRESHOLD_DROP_DB: f32 = 30.0;

/// Ratio multiplier slope of the compress macro (per percent)
pub const COMPRESS_RATIO_GROWTH: f32 = 0.03;

/// Soft-knee downward compression curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainComputer {
    threshold_db: f32,
    knee_db: f32,
    slope: f32,
}

impl Default for GainComputer {
    fn default() -> Self {
        Self::new(-20.0, 4.0, 3.0)
    }
}

impl GainComputer {
    pub fn new(threshold_db: f32, ratio: f32, knee_db: f32) -> Self {
        Self {
            threshold_db,
            knee_db: knee_db.max(0.0),
            slope: Self::slope_for(ratio),
        }
    }

    /// Build the curve from the user-facing controls
    ///
    /// `compress` (0..100%) lowers the threshold by up to
    /// [`COMPRESS_THRESHOLD_DROP_DB`] and raises the ratio by up to 4x. At
    /// 0% the curve is exactly `threshold`/`ratio`.
    pub fn from_controls(threshold_db: f32, ratio: f32, knee_db: f32, compress: f32) -> Self {
        let compress = compress.clamp(0.0, 100.0);
        if compress <= 0.0 {
            return Self::new(threshold_db, ratio, knee_db);
        }
        let threshold = threshold_db - COMPRESS_THRESHOLD_DROP_DB * compress / 100.0;
        let ratio = (ratio * (1.0 + COMPRESS_RATIO_GROWTH * compress)).min(LIMIT_RATIO);
        Self::new(threshold, ratio, knee_db)
    }

    /// Slope `1 - 1/ratio`, saturating to 1.0 for limiting ratios
    ///
    /// Ratios below 1:1 (or NaN) clamp to 1:1, infinite or very large ratios
    /// give a slope of exactly 1.0 without overflow.
    #[inline]
    pub fn slope_for(ratio: f32) -> f32 {
        if ratio.is_nan() || ratio <= 1.0 {
            0.0
        } else if ratio >= LIMIT_RATIO {
            1.0
        } else {
            1.0 - ratio.recip()
        }
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn knee_db(&self) -> f32 {
        self.knee_db
    }

    pub fn slope(&self) -> f32 {
        self.slope
    }

    /// Gain reduction in dB (non-negative) for a detector level in dB
    #[inline]
    pub fn reduction_db(&self, level_db: f32) -> f32 {
        let level_db = level_db.max(LEVEL_FLOOR_DB);
        let over = level_db - self.threshold_db;
        let half_knee = self.knee_db * 0.5;

        if over <= -half_knee {
            0.0
        } else if over >= half_knee {
            self.slope * over
        } else {
            let knee_input = over + half_knee;
            self.slope * knee_input * knee_input / (2.0 * self.knee_db)
        }
    }

    /// Gain reduction with the Stack double-compression pass blended in
    ///
    /// The level left after the first pass runs through the curve again;
    /// `stack` (0..1) scales how much of that second reduction is added.
    /// A stack of 0.0 returns the single-pass reduction unchanged.
    #[inline]
    pub fn stacked_reduction_db(&self, level_db: f32, stack: f32) -> f32 {
        let first = self.reduction_db(level_db);
        if stack <= 0.0 {
            return first;
        }
        let second = self.reduction_db(level_db - first);
        first + stack.min(1.0) * second
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Analytic curve written out independently for comparison
    fn analytic(level: f32, threshold: f32, ratio: f32, knee: f32) -> f32 {
        let x = level - threshold;
        let s = 1.0 - 1.0 / ratio;
        if 2.0 * x < -knee {
            0.0
        } else if 2.0 * x > knee {
            s * x
        } else {
            s * (x + knee / 2.0).powi(2) / (2.0 * knee)
        }
    }

    #[test]
    fn test_no_reduction_below_knee() {
        let curve = GainComputer::new(-20.0, 4.0, 6.0);
        for level in [-120.0, -60.0, -30.0, -23.0] {
            assert_eq!(curve.reduction_db(level), 0.0);
        }
    }

    #[test]
    fn test_hard_knee_scenario() {
        // -10 dB into -20 dB threshold at 4:1 => 10 * 0.75 = 7.5 dB
        let curve = GainComputer::new(-20.0, 4.0, 0.0);
        assert!((curve.reduction_db(-10.0) - 7.5).abs() < 1e-5);
    }

    #[test]
    fn test_reduction_never_negative() {
        let curve = GainComputer::new(-35.0, 8.0, 12.0);
        let mut level = -150.0;
        while level < 30.0 {
            assert!(curve.reduction_db(level) >= 0.0);
            level += 0.25;
        }
    }

    #[test]
    fn test_matches_analytic_curve() {
        let (t, r, k) = (-18.0, 3.0, 10.0);
        let curve = GainComputer::new(t, r, k);
        let mut level = -40.0;
        while level < 10.0 {
            let got = curve.reduction_db(level);
            let want = analytic(level, t, r, k);
            assert!((got - want).abs() < 1e-4, "at {}: {} vs {}", level, got, want);
            level += 0.1;
        }
    }

    #[test]
    fn test_knee_boundaries_are_continuous() {
        let curve = GainComputer::new(-20.0, 4.0, 8.0);
        let eps = 1e-3;
        for boundary in [-24.0_f32, -16.0] {
            let below = curve.reduction_db(boundary - eps);
            let at = curve.reduction_db(boundary);
            let above = curve.reduction_db(boundary + eps);
            assert!((above - below).abs() < 2e-3, "value jump at {}", boundary);

            // One-sided derivatives must agree
            let left = (at - below) / eps;
            let right = (above - at) / eps;
            assert!(
                (left - right).abs() < 0.01,
                "slope jump at {}: {} vs {}",
                boundary,
                left,
                right
            );
        }
    }

    #[test]
    fn test_limiting_ratio_has_unit_slope() {
        assert_eq!(GainComputer::slope_for(LIMIT_RATIO), 1.0);
        assert_eq!(GainComputer::slope_for(f32::INFINITY), 1.0);
        let curve = GainComputer::new(-10.0, f32::INFINITY, 0.0);
        assert!((curve.reduction_db(0.0) - 10.0).abs() < 1e-6);
        assert!(curve.reduction_db(1e30).is_finite());
    }

    #[test]
    fn test_ratio_below_one_is_clamped() {
        assert_eq!(GainComputer::slope_for(0.5), 0.0);
        assert_eq!(GainComputer::slope_for(f32::NAN), 0.0);
        let curve = GainComputer::new(-20.0, 0.2, 0.0);
        assert_eq!(curve.reduction_db(0.0), 0.0);
    }

    #[test]
    fn test_compress_zero_is_identity() {
        let plain = GainComputer::new(-24.0, 6.0, 3.0);
        let via_macro = GainComputer::from_controls(-24.0, 6.0, 3.0, 0.0);
        assert_eq!(plain, via_macro);
    }

    #[test]
    fn test_compress_deepens_reduction() {
        let light = GainComputer::from_controls(-20.0, 2.0, 3.0, 0.0);
        let heavy = GainComputer::from_controls(-20.0, 2.0, 3.0, 100.0);
        assert!(heavy.reduction_db(-10.0) > light.reduction_db(-10.0));
        assert!((heavy.threshold_db() + 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_stack_zero_is_single_pass() {
        let curve = GainComputer::new(-20.0, 4.0, 0.0);
        assert_eq!(curve.stacked_reduction_db(-5.0, 0.0), curve.reduction_db(-5.0));
    }

    #[test]
    fn test_full_stack_adds_second_pass() {
        let curve = GainComputer::new(-20.0, 2.0, 0.0);
        // First pass: 20 dB over -> 10 dB reduction, leaves -10 dB
        // Second pass: 10 dB over -> 5 dB reduction
        let stacked = curve.stacked_reduction_db(0.0, 1.0);
        assert!((stacked - 15.0).abs() < 1e-4);
    }
}
