//! Gate / Expander
//!
//! Downward expander below an independent gate threshold. Every dB the
//! detector level falls below the threshold adds `GATE_RATIO - 1` dB of
//! attenuation, capped at [`GATE_RANGE_DB`]. The attenuation is smoothed in
//! the dB domain with its own open/close times so the gate boundary never
//! clicks.
//!
//! The gate produces a reduction in dB, it does not touch samples. The
//! kernel combines it with the compressor reduction via `max`.

use crate::units::{time_constant_coeff, LEVEL_FLOOR_DB};

/// Expansion ratio (1:4)
pub const GATE_RATIO: f32 = 4.0;

/// Deepest attenuation the gate applies
pub const GATE_RANGE_DB: f32 = 90.0;

/// Time for the gate to open (attenuation falling)
pub const GATE_OPEN_MS: f32 = 1.0;

/// Time for the gate to close (attenuation rising)
pub const GATE_CLOSE_MS: f32 = 60.0;

/// Smoothed downward expander for one detector lane
#[derive(Debug, Clone)]
pub struct Gate {
    attenuation_db: f32,
    open_coeff: f32,
    close_coeff: f32,
}

impl Gate {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            attenuation_db: 0.0,
            open_coeff: time_constant_coeff(GATE_OPEN_MS, sample_rate),
            close_coeff: time_constant_coeff(GATE_CLOSE_MS, sample_rate),
        }
    }

    /// Static expansion curve: target attenuation for a level in dB
    #[inline]
    pub fn target_db(level_db: f32, threshold_db: f32) -> f32 {
        let below = threshold_db - level_db.max(LEVEL_FLOOR_DB);
        if below <= 0.0 {
            0.0
        } else {
            (below * (GATE_RATIO - 1.0)).min(GATE_RANGE_DB)
        }
    }

    /// Advance one sample and return the smoothed attenuation in dB
    ///
    /// # Real-time Safety
    /// No allocations, O(1) time.
    #[inline]
    pub fn process(&mut self, level_db: f32, threshold_db: f32) -> f32 {
        let target = Self::target_db(level_db, threshold_db);
        let coeff = if target > self.attenuation_db {
            self.close_coeff
        } else {
            self.open_coeff
        };
        self.attenuation_db = coeff * self.attenuation_db + (1.0 - coeff) * target;
        self.attenuation_db
    }

    /// Current attenuation in dB (non-negative)
    #[inline]
    pub fn attenuation_db(&self) -> f32 {
        self.attenuation_db
    }

    pub fn reset(&mut self) {
        self.attenuation_db = 0.0;
    }
}
