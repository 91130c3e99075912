//! Level Detector
//!
//! Produces an instantaneous, non-negative linear level for every frame.
//! Peak (|x|) and RMS (moving average of x² over [`RMS_WINDOW_MS`]) are
//! computed side by side and blended, so moving the detection control
//! crossfades between the two characters instead of switching abruptly.
//!
//! Multi-channel input is detected either per channel or linked into a
//! single lane (maximum or average across channels).

use serde::{Deserialize, Serialize};

use crate::error::DspError;
use crate::units::millis_to_samples;

/// Length of the RMS averaging window
pub const RMS_WINDOW_MS: f32 = 5.0;

/// Magnitudes are clamped here (+120 dBFS) so squares stay finite
const DETECTOR_CEILING: f32 = 1e6;

/// How channels share the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorLink {
    /// Every channel has its own detector, envelope and gain
    Independent,
    /// One lane driven by the loudest channel (stereo-coherent)
    #[default]
    LinkedMax,
    /// One lane driven by the mean across channels
    LinkedAverage,
}

impl DetectorLink {
    /// Number of detector lanes needed for `channels` input channels
    pub fn lanes(self, channels: usize) -> usize {
        match self {
            DetectorLink::Independent => channels,
            DetectorLink::LinkedMax | DetectorLink::LinkedAverage => 1,
        }
    }

    /// Stable lowercase name, used in logs
    pub fn name(self) -> &'static str {
        match self {
            DetectorLink::Independent => "independent",
            DetectorLink::LinkedMax => "linked-max",
            DetectorLink::LinkedAverage => "linked-average",
        }
    }
}

/// Moving average of squared samples over a fixed window
///
/// The running sum is kept in f64 and clamped at zero so rounding never
/// produces a negative mean square.
#[derive(Debug, Clone)]
pub struct RmsWindow {
    squares: Vec<f32>,
    pos: usize,
    sum: f64,
}

impl RmsWindow {
    /// Allocate a window of `len` samples (at least one)
    pub fn new(len: usize) -> Result<Self, DspError> {
        let len = len.max(1);
        let mut squares = Vec::new();
        squares
            .try_reserve_exact(len)
            .map_err(|_| DspError::AllocationFailed {
                what: "RMS window",
                samples: len,
            })?;
        squares.resize(len, 0.0);
        Ok(Self {
            squares,
            pos: 0,
            sum: 0.0,
        })
    }

    /// Push one squared sample and return the current mean square
    #[inline]
    pub fn push(&mut self, square: f32) -> f32 {
        let oldest = self.squares[self.pos];
        self.squares[self.pos] = square;
        self.pos += 1;
        if self.pos == self.squares.len() {
            self.pos = 0;
        }
        self.sum = (self.sum + square as f64 - oldest as f64).max(0.0);
        (self.sum / self.squares.len() as f64) as f32
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    pub fn reset(&mut self) {
        self.squares.fill(0.0);
        self.pos = 0;
        self.sum = 0.0;
    }
}

/// Peak/RMS level detector for one or more lanes
#[derive(Debug, Clone)]
pub struct LevelDetector {
    link: DetectorLink,
    channels: usize,
    windows: Vec<RmsWindow>,
}

impl LevelDetector {
    /// Allocate detector state for `channels` channels at `sample_rate`
    ///
    /// This allocates; call it from the configuration path only.
    pub fn new(link: DetectorLink, channels: usize, sample_rate: f32) -> Result<Self, DspError> {
        if !(sample_rate > 0.0 && sample_rate.is_finite()) {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        let window_len = millis_to_samples(RMS_WINDOW_MS, sample_rate);
        let lanes = link.lanes(channels);
        let mut windows = Vec::new();
        windows
            .try_reserve_exact(lanes)
            .map_err(|_| DspError::AllocationFailed {
                what: "detector lane",
                samples: lanes,
            })?;
        for _ in 0..lanes {
            windows.push(RmsWindow::new(window_len)?);
        }
        Ok(Self {
            link,
            channels,
            windows,
        })
    }

    pub fn link(&self) -> DetectorLink {
        self.link
    }

    /// Number of independent output levels per frame
    pub fn lanes(&self) -> usize {
        self.windows.len()
    }

    /// Detect one frame
    ///
    /// `frame` holds one sample per channel. `rms_blend` is 0.0 for pure
    /// peak and 1.0 for pure RMS. One level per lane is written to `levels`.
    ///
    /// # Real-time Safety
    /// No allocations, O(channels).
    #[inline]
    pub fn detect(&mut self, frame: &[f32], rms_blend: f32, levels: &mut [f32]) {
        debug_assert_eq!(frame.len(), self.channels);
        debug_assert_eq!(levels.len(), self.windows.len());

        let blend = rms_blend.clamp(0.0, 1.0);
        match self.link {
            DetectorLink::Independent => {
                for ((sample, window), level) in
                    frame.iter().zip(self.windows.iter_mut()).zip(levels.iter_mut())
                {
                    let peak = sample.abs().min(DETECTOR_CEILING);
                    let rms = window.push(peak * peak).sqrt();
                    *level = peak * (1.0 - blend) + rms * blend;
                }
            }
            DetectorLink::LinkedMax => {
                let peak = frame
                    .iter()
                    .fold(0.0_f32, |acc, s| acc.max(s.abs()))
                    .min(DETECTOR_CEILING);
                let rms = self.windows[0].push(peak * peak).sqrt();
                levels[0] = peak * (1.0 - blend) + rms * blend;
            }
            DetectorLink::LinkedAverage => {
                let count = frame.len().max(1) as f32;
                let magnitude = |s: &f32| s.abs().min(DETECTOR_CEILING);
                let peak = frame.iter().map(magnitude).sum::<f32>() / count;
                let mean_square = frame.iter().map(|s| magnitude(s).powi(2)).sum::<f32>() / count;
                let rms = self.windows[0].push(mean_square).sqrt();
                levels[0] = peak * (1.0 - blend) + rms * blend;
            }
        }
    }

    /// Clear the RMS history
    pub fn reset(&mut self) {
        for window in &mut self.windows {
            window.reset();
        }
    }
}
