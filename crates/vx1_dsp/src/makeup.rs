//! Makeup Gain
//!
//! Manual makeup is the user's dB value. Auto makeup estimates the loss from
//! the static curve alone: half the reduction a 0 dBFS signal would receive.
//! The two modes are exclusive.

use crate::gain_computer::GainComputer;

/// Reference level the auto estimate is taken at
pub const AUTO_MAKEUP_REFERENCE_DB: f32 = 0.0;

/// Share of the reference reduction that auto mode restores
pub const AUTO_MAKEUP_SHARE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MakeupMode {
    Manual(f32),
    Auto,
}

impl MakeupMode {
    /// Makeup in dB for the given curve
    #[inline]
    pub fn gain_db(self, curve: &GainComputer) -> f32 {
        match self {
            MakeupMode::Manual(db) => db,
            MakeupMode::Auto => {
                AUTO_MAKEUP_SHARE * curve.reduction_db(AUTO_MAKEUP_REFERENCE_DB)
            }
        }
    }
}
