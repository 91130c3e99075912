//! Parameter Smoothing
//!
//! Turns control-rate parameter jumps into short audio-rate ramps so the
//! render path never sees a discontinuity.
//!
//! - [`LinearSmoother`] ramps continuous values over a fixed window.
//! - [`EqualPowerFade`] crossfades two signal paths for switch-like
//!   parameters (bypass) where a linear gain ramp would dip in level.

use std::f32::consts::FRAC_PI_2;

use crate::units::millis_to_samples;

/// Fixed smoothing window for every automatable parameter
pub const SMOOTHING_MS: f32 = 10.0;

/// Linear ramp toward the most recent target
///
/// Every retarget restarts a ramp of exactly `ramp_samples` steps, so the
/// target is reached in bounded time whatever the jump size. The final step
/// snaps to the target, so there is no overshoot and no float drift.
#[derive(Debug, Clone)]
pub struct LinearSmoother {
    current: f32,
    target: f32,
    step: f32,
    steps_left: usize,
    ramp_samples: usize,
}

impl LinearSmoother {
    /// Create a smoother resting at `value`
    pub fn new(value: f32, sample_rate: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            steps_left: 0,
            ramp_samples: millis_to_samples(SMOOTHING_MS, sample_rate).max(1),
        }
    }

    /// Start a new ramp from the current value to `target`
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        self.steps_left = self.ramp_samples;
        self.step = (target - self.current) / self.ramp_samples as f32;
    }

    /// Jump straight to `value` with no ramp
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.steps_left = 0;
    }

    /// Advance one sample and return the smoothed value
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.steps_left > 0 {
            self.steps_left -= 1;
            if self.steps_left == 0 {
                self.current = self.target;
            } else {
                self.current += self.step;
            }
        }
        self.current
    }

    /// Current smoothed value without advancing
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Value the ramp is heading to
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether a ramp is still in progress
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.steps_left > 0
    }

    /// Length of a full ramp in samples
    pub fn ramp_samples(&self) -> usize {
        self.ramp_samples
    }
}

/// Equal-power crossfade between a released path and an engaged path
///
/// The fade position moves linearly between 0.0 (released) and 1.0
/// (engaged); the path gains follow a sine/cosine law so the summed power of
/// two uncorrelated paths stays constant. The endpoints are exact: a settled
/// fade yields gains of precisely 0.0 and 1.0.
#[derive(Debug, Clone)]
pub struct EqualPowerFade {
    position: LinearSmoother,
}

impl EqualPowerFade {
    pub fn new(engaged: bool, sample_rate: f32) -> Self {
        Self {
            position: LinearSmoother::new(if engaged { 1.0 } else { 0.0 }, sample_rate),
        }
    }

    /// Request the engaged (true) or released (false) state
    #[inline]
    pub fn set_engaged(&mut self, engaged: bool) {
        self.position.set_target(if engaged { 1.0 } else { 0.0 });
    }

    /// Jump straight to a state with no crossfade
    pub fn reset(&mut self, engaged: bool) {
        self.position.reset(if engaged { 1.0 } else { 0.0 });
    }

    /// Advance one sample and return `(released_gain, engaged_gain)`
    #[inline]
    pub fn next(&mut self) -> (f32, f32) {
        let p = self.position.next();
        if p <= 0.0 {
            (1.0, 0.0)
        } else if p >= 1.0 {
            (0.0, 1.0)
        } else {
            let angle = p * FRAC_PI_2;
            (angle.cos(), angle.sin())
        }
    }

    /// Whether the fade has settled fully on the engaged side
    #[inline]
    pub fn is_fully_engaged(&self) -> bool {
        !self.position.is_smoothing() && self.position.current() >= 1.0
    }

    /// Whether the fade has settled fully on the released side
    #[inline]
    pub fn is_fully_released(&self) -> bool {
        !self.position.is_smoothing() && self.position.current() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoother_starts_settled() {
        let mut s = LinearSmoother::new(0.5, 48000.0);
        assert!(!s.is_smoothing());
        assert_eq!(s.next(), 0.5);
    }

    #[test]
    fn test_ramp_length_is_ten_ms() {
        let s = LinearSmoother::new(0.0, 48000.0);
        assert_eq!(s.ramp_samples(), 480);
    }

    #[test]
    fn test_reaches_target_in_bounded_samples() {
        for jump in [0.001_f32, 1.0, 100.0, -5000.0] {
            let mut s = LinearSmoother::new(0.0, 48000.0);
            s.set_target(jump);
            for _ in 0..s.ramp_samples() {
                s.next();
            }
            assert_eq!(s.current(), jump, "jump {} should land exactly", jump);
            assert!(!s.is_smoothing());
        }
    }

    #[test]
    fn test_monotonic_without_overshoot() {
        let mut s = LinearSmoother::new(-20.0, 44100.0);
        s.set_target(-3.0);
        let mut previous = s.current();
        for _ in 0..1000 {
            let value = s.next();
            assert!(value >= previous, "ramp must not go backwards");
            assert!(value <= -3.0, "ramp must not overshoot: {}", value);
            previous = value;
        }
        assert_eq!(previous, -3.0);
    }

    #[test]
    fn test_retarget_mid_ramp_restarts_from_current() {
        let mut s = LinearSmoother::new(0.0, 48000.0);
        s.set_target(1.0);
        for _ in 0..240 {
            s.next();
        }
        let midway = s.current();
        assert!(midway > 0.4 && midway < 0.6);

        s.set_target(0.0);
        let first = s.next();
        assert!(first < midway);
        for _ in 0..s.ramp_samples() {
            s.next();
        }
        assert_eq!(s.current(), 0.0);
    }

    #[test]
    fn test_same_target_does_not_restart() {
        let mut s = LinearSmoother::new(0.0, 48000.0);
        s.set_target(1.0);
        for _ in 0..100 {
            s.next();
        }
        let before = s.current();
        s.set_target(1.0);
        assert!(s.next() > before);
    }

    #[test]
    fn test_fade_endpoints_are_exact() {
        let mut fade = EqualPowerFade::new(false, 48000.0);
        assert_eq!(fade.next(), (1.0, 0.0));
        assert!(fade.is_fully_released());

        fade.set_engaged(true);
        for _ in 0..480 {
            fade.next();
        }
        assert_eq!(fade.next(), (0.0, 1.0));
        assert!(fade.is_fully_engaged());
    }

    #[test]
    fn test_fade_keeps_constant_power() {
        let mut fade = EqualPowerFade::new(false, 48000.0);
        fade.set_engaged(true);
        for _ in 0..480 {
            let (released, engaged) = fade.next();
            let power = released * released + engaged * engaged;
            assert!((power - 1.0).abs() < 1e-5);
        }
    }
}
