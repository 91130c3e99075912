//! Sheen: air emphasis and output ceiling
//!
//! A fixed +6 dB high shelf at 10 kHz (clamped below Nyquist at low sample
//! rates) followed by the tanh soft clipper at -1 dBFS. The control blends
//! the shelved, clipped signal against the input, so the shelf filter keeps
//! running at 0 % and engaging the stage never starts from a cold filter.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type, Q_BUTTERWORTH_F32};

use super::soft_clip::SoftClipper;
use super::ColorationStage;
use crate::error::DspError;

/// Shelf corner frequency
pub const SHEEN_FREQUENCY_HZ: f32 = 10_000.0;

/// Shelf gain at 100 %
pub const SHEEN_SHELF_DB: f32 = 6.0;

/// Keeps the shelf state finite whatever reaches the stage (+120 dBFS)
const FILTER_INPUT_LIMIT: f32 = 1e6;

/// Sheen stage for one channel
pub struct Sheen {
    shelf: DirectForm2Transposed<f32>,
    clipper: SoftClipper,
}

impl Sheen {
    pub fn new(sample_rate: f32) -> Result<Self, DspError> {
        let frequency = SHEEN_FREQUENCY_HZ.min(sample_rate * 0.45);
        let coeffs = Coefficients::<f32>::from_params(
            Type::HighShelf(SHEEN_SHELF_DB),
            sample_rate.hz(),
            frequency.hz(),
            Q_BUTTERWORTH_F32,
        )
        .map_err(|_| DspError::InvalidCoefficients {
            frequency,
            sample_rate,
        })?;

        Ok(Self {
            shelf: DirectForm2Transposed::<f32>::new(coeffs),
            clipper: SoftClipper::default(),
        })
    }
}

impl ColorationStage for Sheen {
    #[inline]
    fn process(&mut self, input: f32, amount: f32) -> f32 {
        let shelved = self.shelf.run(input.clamp(-FILTER_INPUT_LIMIT, FILTER_INPUT_LIMIT));
        if amount <= 0.0 {
            return input;
        }
        let amount = amount.min(1.0);
        input * (1.0 - amount) + self.clipper.process_sample(shelved) * amount
    }

    fn reset(&mut self) {
        self.shelf.reset_state();
    }

    fn name(&self) -> &'static str {
        "Sheen"
    }
}
