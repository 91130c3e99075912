//! Level and time conversions shared by every DSP unit

/// Smallest linear level the dynamics path distinguishes from silence (-120 dB)
pub const LEVEL_FLOOR: f32 = 1e-6;

/// Level reported for silence, in dB
pub const LEVEL_FLOOR_DB: f32 = -120.0;

/// Convert decibels to linear amplitude
/// Formula: amplitude = 10^(dB/20)
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels, floored at [`LEVEL_FLOOR_DB`]
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.abs().max(LEVEL_FLOOR).log10()
}

/// Number of whole samples covering `ms` milliseconds, rounded up
#[inline]
pub fn millis_to_samples(ms: f32, sample_rate: f32) -> usize {
    let samples = (ms.max(0.0) as f64 * sample_rate as f64 / 1000.0).ceil();
    samples as usize
}

/// One-pole smoothing coefficient for a time constant in milliseconds
///
/// `coeff = exp(-1 / (ms * 0.001 * sample_rate))`. A time of zero (or less)
/// returns 0.0, which makes the follower track its input instantly instead
/// of dividing by zero.
#[inline]
pub fn time_constant_coeff(ms: f32, sample_rate: f32) -> f32 {
    let samples = ms * 0.001 * sample_rate;
    if samples <= f32::EPSILON || !samples.is_finite() {
        return 0.0;
    }
    (-1.0 / samples).exp()
}
