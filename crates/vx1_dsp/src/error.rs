//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while sizing or configuring DSP units
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),

    #[error("Look-ahead of {ms}ms is outside the supported 0-{max}ms range")]
    InvalidLookAhead { ms: f32, max: f32 },

    #[error("Failed to allocate {samples} samples of {what} storage")]
    AllocationFailed { what: &'static str, samples: usize },

    #[error("Invalid filter coefficients for frequency {frequency}Hz at sample rate {sample_rate}Hz")]
    InvalidCoefficients { frequency: f32, sample_rate: f32 },
}
