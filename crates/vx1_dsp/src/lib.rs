//! VX1 DSP - Dynamics Building Blocks
//!
//! Sample-level units the VX1 compressor kernel is assembled from:
//! - Peak/RMS level detection with channel linking
//! - Attack/release envelope following with program-dependent release
//! - Soft-knee gain computer with compress macro and stacked second pass
//! - Smoothed downward expander (gate)
//! - Look-ahead delay lines
//! - Grip / Bite / Sheen coloration stages
//! - Parameter smoothing, makeup gain and dry/wet mixing
//!
//! # Architecture
//!
//! Every unit allocates in its constructor only. Per-sample methods take
//! `&mut self`, never allocate and run in constant time, so they are safe to
//! call from the audio callback.

pub mod coloration;
mod detector;
mod envelope;
mod error;
mod gain_computer;
mod gate;
mod look_ahead;
mod makeup;
pub mod mixer;
mod processor;
mod smoother;
pub mod units;

pub use coloration::{ColorAmounts, ColorationChain, ColorationStage};
pub use detector::{DetectorLink, LevelDetector, RmsWindow, RMS_WINDOW_MS};
pub use envelope::{EnvelopeFollower, ProgramRelease, SUSTAIN_FULL_SCALE_DB, SUSTAIN_WINDOW_MS};
pub use error::DspError;
pub use gain_computer::{
    GainComputer, COMPRESS_RATIO_GROWTH, COMPRESS_THRESHOLD_DROP_DB, LIMIT_RATIO,
};
pub use gate::{Gate, GATE_CLOSE_MS, GATE_OPEN_MS, GATE_RANGE_DB, GATE_RATIO};
pub use look_ahead::{DelayLine, LookAheadBuffer, MAX_LOOK_AHEAD_MS};
pub use makeup::{MakeupMode, AUTO_MAKEUP_REFERENCE_DB, AUTO_MAKEUP_SHARE};
pub use processor::{AudioProcessor, ProcessContext};
pub use smoother::{EqualPowerFade, LinearSmoother, SMOOTHING_MS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let _curve = GainComputer::default();
        let _gate = Gate::new(48000.0);
        let _link = DetectorLink::default();
        assert!(ColorationChain::new(48000.0).is_ok());
    }
}
