//! Dry/Wet Mixer

/// Linear blend: `dry * (1 - mix) + wet * mix`
///
/// `mix` is 0.0..=1.0. The endpoints return exactly dry or exactly wet.
#[inline]
pub fn mix(dry: f32, wet: f32, mix: f32) -> f32 {
    if mix <= 0.0 {
        dry
    } else if mix >= 1.0 {
        wet
    } else {
        dry * (1.0 - mix) + wet * mix
    }
}
