//! Output Soft Clipper
//!
//! Smooth tanh ceiling used at the end of the Sheen stage:
//! - Below threshold: linear (unity gain)
//! - Above threshold: the excess is squashed by tanh into the remaining headroom
//!
//! Output magnitude approaches but never exceeds 1.0.

use crate::units::db_to_gain;

/// Ceiling where the clipper starts to bend the signal
pub const SOFT_CLIP_THRESHOLD_DB: f32 = -1.0;

/// Stateless tanh soft clipper
#[derive(Debug, Clone, Copy)]
pub struct SoftClipper {
    threshold: f32,
}

impl SoftClipper {
    /// Create a clipper bending above `threshold_db` (dBFS, at most 0)
    pub fn new(threshold_db: f32) -> Self {
        Self {
            threshold: db_to_gain(threshold_db.min(0.0)),
        }
    }

    /// Linear threshold
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// # Real-time Safety
    /// No allocations, no syscalls, O(1) time.
    #[inline]
    pub fn process_sample(&self, sample: f32) -> f32 {
        soft_clip(sample, self.threshold)
    }
}

impl Default for SoftClipper {
    fn default() -> Self {
        Self::new(SOFT_CLIP_THRESHOLD_DB)
    }
}

/// Threshold maps to itself; the limit at infinity is exactly ±1.0.
#[inline]
pub fn soft_clip(sample: f32, threshold: f32) -> f32 {
    let magnitude = sample.abs();
    if magnitude <= threshold {
        return sample;
    }
    let headroom = (1.0 - threshold).max(0.001);
    let squashed = headroom * ((magnitude - threshold) / headroom).tanh();
    (threshold + squashed).min(1.0).copysign(sample)
}
