//! Bite: post-gain tape saturation
//!
//! ```text
//! drive = 1 + 3a
//! wet   = (tanh(1.5 * drive * x) + 0.15 * tanh(2 * drive * x)) * 1.2 / drive
//! out   = x * (1 - a) + wet * a
//! ```
//!
//! The second tanh adds upper harmonics, the `1.2 / drive` factor holds the
//! perceived level roughly steady as the drive rises.

use super::ColorationStage;

/// Bite stage (stateless)
#[derive(Debug, Clone, Copy, Default)]
pub struct Bite;

impl Bite {
    /// Saturated signal at full blend
    #[inline]
    pub fn saturate(input: f32, amount: f32) -> f32 {
        let drive = 1.0 + 3.0 * amount;
        let driven = input * drive;
        let saturated = (driven * 1.5).tanh() + (driven * 2.0).tanh() * 0.15;
        saturated * 1.2 / drive
    }
}

impl ColorationStage for Bite {
    #[inline]
    fn process(&mut self, input: f32, amount: f32) -> f32 {
        if amount <= 0.0 {
            return input;
        }
        let amount = amount.min(1.0);
        input * (1.0 - amount) + Self::saturate(input, amount) * amount
    }

    fn reset(&mut self) {}

    fn name(&self) -> &'static str {
        "Bite"
    }
}
