//! Coloration Stages
//!
//! Nonlinear shaping around the gain stage, in a fixed order:
//!
//! ```text
//! Grip (pre-gain) -> gain -> Bite -> Sheen
//! ```
//!
//! Each stage takes its control as 0.0..=1.0. At 0.0 a stage returns its
//! input bit-for-bit; internal filters still run so re-engaging is seamless.

mod bite;
mod grip;
mod sheen;
pub mod soft_clip;

pub use bite::Bite;
pub use grip::{tube_curve, DcBlocker, Grip, DC_BLOCKER_HZ};
pub use sheen::{Sheen, SHEEN_FREQUENCY_HZ, SHEEN_SHELF_DB};
pub use soft_clip::{SoftClipper, SOFT_CLIP_THRESHOLD_DB};

use crate::error::DspError;

/// A single-channel shaping stage driven by a 0..1 amount
///
/// # Real-time Safety Contract
/// `process` must not allocate, lock or block.
pub trait ColorationStage: Send {
    fn process(&mut self, input: f32, amount: f32) -> f32;

    /// Clear filter state
    fn reset(&mut self);

    fn name(&self) -> &'static str;
}

/// Stage amounts for one sample, each 0.0..=1.0
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorAmounts {
    pub grip: f32,
    pub bite: f32,
    pub sheen: f32,
}

/// The three stages for one channel
pub struct ColorationChain {
    grip: Grip,
    bite: Bite,
    sheen: Sheen,
}

impl ColorationChain {
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        Ok(Self {
            grip: Grip::new(sample_rate),
            bite: Bite,
            sheen: Sheen::new(sample_rate)?,
        })
    }

    /// Shaping applied before the gain stage
    #[inline]
    pub fn pre_gain(&mut self, input: f32, amounts: &ColorAmounts) -> f32 {
        self.grip.process(input, amounts.grip)
    }

    /// Shaping applied after the gain stage
    #[inline]
    pub fn post_gain(&mut self, input: f32, amounts: &ColorAmounts) -> f32 {
        let bitten = self.bite.process(input, amounts.bite);
        self.sheen.process(bitten, amounts.sheen)
    }

    pub fn reset(&mut self) {
        self.grip.reset();
        self.bite.reset();
        self.sheen.reset();
    }

    /// Stage names in processing order
    pub fn stage_names(&self) -> [&'static str; 3] {
        [self.grip.name(), self.bite.name(), self.sheen.name()]
    }
}
