//! Envelope Follower
//!
//! Two-regime one-pole follower over the detector output:
//! - attack: level above the envelope, rise with the attack coefficient
//! - release: level at or below the envelope, fall with the release coefficient
//!
//! # Program-dependent release
//!
//! [`ProgramRelease`] tracks a slow average of recent gain reduction and
//! stretches or shortens the release time from it. With `s = speed` (0..1)
//! and `f = clamp(sustained_db / 12, 0, 1)`:
//!
//! ```text
//! effective_release = release * ((1 - s) + s * (0.25 + 1.75 * f))
//! ```
//!
//! Brief peaks leave the average low and release up to 4x faster; sustained
//! heavy reduction pushes the average up and releases up to 2x slower.

use crate::units::time_constant_coeff;

/// Time constant of the sustained gain-reduction average
pub const SUSTAIN_WINDOW_MS: f32 = 300.0;

/// Sustained reduction at which release reaches its slowest stretch
pub const SUSTAIN_FULL_SCALE_DB: f32 = 12.0;

const FASTEST_RELEASE_SCALE: f32 = 0.25;
const SLOWEST_RELEASE_SCALE: f32 = 2.0;

/// Attack/release envelope follower in the linear domain
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeFollower {
    pub fn new(attack_ms: f32, release_ms: f32, sample_rate: f32) -> Self {
        Self {
            envelope: 0.0,
            attack_coeff: time_constant_coeff(attack_ms, sample_rate),
            release_coeff: time_constant_coeff(release_ms, sample_rate),
        }
    }

    /// Update the attack time constant
    #[inline]
    pub fn set_attack(&mut self, attack_ms: f32, sample_rate: f32) {
        self.attack_coeff = time_constant_coeff(attack_ms, sample_rate);
    }

    /// Update the release time constant
    #[inline]
    pub fn set_release(&mut self, release_ms: f32, sample_rate: f32) {
        self.release_coeff = time_constant_coeff(release_ms, sample_rate);
    }

    /// Follow one detector value and return the new envelope
    #[inline]
    pub fn process(&mut self, level: f32) -> f32 {
        let coeff = if level > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * level;
        self.envelope
    }

    /// Current envelope value
    #[inline]
    pub fn value(&self) -> f32 {
        self.envelope
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

/// Gain-reduction history driving the adaptive release time
#[derive(Debug, Clone)]
pub struct ProgramRelease {
    sustained_db: f32,
    coeff: f32,
}

impl ProgramRelease {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sustained_db: 0.0,
            coeff: time_constant_coeff(SUSTAIN_WINDOW_MS, sample_rate),
        }
    }

    /// Feed the latest gain reduction (dB, non-negative)
    #[inline]
    pub fn update(&mut self, reduction_db: f32) {
        self.sustained_db = self.coeff * self.sustained_db + (1.0 - self.coeff) * reduction_db.max(0.0);
    }

    /// Averaged gain reduction over roughly the last [`SUSTAIN_WINDOW_MS`]
    #[inline]
    pub fn sustained_db(&self) -> f32 {
        self.sustained_db
    }

    /// Release time after applying the program-dependent stretch
    ///
    /// `speed` is the depth of the effect, 0.0 (fixed release) to 1.0.
    #[inline]
    pub fn effective_release_ms(&self, release_ms: f32, speed: f32) -> f32 {
        let speed = speed.clamp(0.0, 1.0);
        let fill = (self.sustained_db / SUSTAIN_FULL_SCALE_DB).clamp(0.0, 1.0);
        let adaptive =
            FASTEST_RELEASE_SCALE + (SLOWEST_RELEASE_SCALE - FASTEST_RELEASE_SCALE) * fill;
        release_ms * ((1.0 - speed) + speed * adaptive)
    }

    pub fn reset(&mut self) {
        self.sustained_db = 0.0;
    }
}
