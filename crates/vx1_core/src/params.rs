//! Parameter Store
//!
//! Flat table of every control the kernel reads, shared between the host's
//! control thread and the audio thread. Values live in `AtomicU32`s holding
//! f32 bits, so a reader sees either the old or the new value, never a torn
//! one.
//!
//! Writes are sanitised at the boundary: out-of-range values clamp, NaN is
//! ignored, unknown raw ids are ignored. Automation noise never turns into
//! an error.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Number of parameters in the table
pub const PARAM_COUNT: usize = 18;

/// Every parameter the kernel reads; the discriminant is the host address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u32)]
pub enum ParamId {
    Threshold = 0,
    Ratio = 1,
    Attack = 2,
    Release = 3,
    MakeupGain = 4,
    Bypass = 5,
    Mix = 6,
    GateThreshold = 7,
    Knee = 8,
    Detection = 9,
    LookAhead = 10,
    Speed = 11,
    Grip = 12,
    Bite = 13,
    Stack = 14,
    Sheen = 15,
    Compress = 16,
    AutoMakeup = 17,
}

/// Range, default and unit of one parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub id: ParamId,
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    pub unit: &'static str,
}

impl ParamSpec {
    /// Clamp into range; NaN yields `None`
    #[inline]
    pub fn sanitize(&self, value: f32) -> Option<f32> {
        if value.is_nan() {
            None
        } else {
            Some(value.clamp(self.min, self.max))
        }
    }
}

const fn spec(
    id: ParamId,
    name: &'static str,
    min: f32,
    max: f32,
    default: f32,
    unit: &'static str,
) -> ParamSpec {
    ParamSpec {
        id,
        name,
        min,
        max,
        default,
        unit,
    }
}

/// The parameter table, indexed by raw id
pub const PARAMS: [ParamSpec; PARAM_COUNT] = [
    spec(ParamId::Threshold, "Threshold", -50.0, 0.0, -20.0, "dB"),
    spec(ParamId::Ratio, "Ratio", 1.0, 100.0, 4.0, ":1"),
    spec(ParamId::Attack, "Attack", 0.0, 200.0, 10.0, "ms"),
    spec(ParamId::Release, "Release", 5.0, 5000.0, 100.0, "ms"),
    spec(ParamId::MakeupGain, "Makeup Gain", -20.0, 50.0, 0.0, "dB"),
    spec(ParamId::Bypass, "Bypass", 0.0, 1.0, 0.0, "bool"),
    spec(ParamId::Mix, "Mix", 0.0, 100.0, 100.0, "%"),
    spec(ParamId::GateThreshold, "Gate Threshold", -80.0, -20.0, -80.0, "dB"),
    spec(ParamId::Knee, "Knee", 0.0, 24.0, 3.0, "dB"),
    spec(ParamId::Detection, "Detection", 0.0, 100.0, 0.0, "%"),
    spec(ParamId::LookAhead, "Look-Ahead", 0.0, 20.0, 0.0, "ms"),
    spec(ParamId::Speed, "Speed", 0.0, 100.0, 0.0, "%"),
    spec(ParamId::Grip, "Grip", 0.0, 100.0, 0.0, "%"),
    spec(ParamId::Bite, "Bite", 0.0, 100.0, 25.0, "%"),
    spec(ParamId::Stack, "Stack", 0.0, 100.0, 0.0, "%"),
    spec(ParamId::Sheen, "Sheen", 0.0, 100.0, 0.0, "%"),
    spec(ParamId::Compress, "Compress", 0.0, 100.0, 0.0, "%"),
    spec(ParamId::AutoMakeup, "Auto Makeup", 0.0, 1.0, 0.0, "bool"),
];

impl ParamId {
    /// All ids in raw-id order
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Threshold,
        ParamId::Ratio,
        ParamId::Attack,
        ParamId::Release,
        ParamId::MakeupGain,
        ParamId::Bypass,
        ParamId::Mix,
        ParamId::GateThreshold,
        ParamId::Knee,
        ParamId::Detection,
        ParamId::LookAhead,
        ParamId::Speed,
        ParamId::Grip,
        ParamId::Bite,
        ParamId::Stack,
        ParamId::Sheen,
        ParamId::Compress,
        ParamId::AutoMakeup,
    ];

    /// Look up a host address
    #[inline]
    pub fn from_raw(raw: u32) -> Option<ParamId> {
        Self::ALL.get(raw as usize).copied()
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn spec(self) -> &'static ParamSpec {
        &PARAMS[self.index()]
    }

    /// Switch-like parameters read as on at 0.5 and above
    pub fn is_toggle(self) -> bool {
        matches!(self, ParamId::Bypass | ParamId::AutoMakeup)
    }
}

/// Serializable copy of every parameter value
///
/// Keys missing on `apply` leave the store untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSnapshot {
    pub values: BTreeMap<ParamId, f32>,
}

impl ParameterSnapshot {
    pub fn get(&self, id: ParamId) -> Option<f32> {
        self.values.get(&id).copied()
    }
}

/// Lock-free parameter storage shared by control and audio threads
pub struct ParameterStore {
    values: [AtomicU32; PARAM_COUNT],
}

impl ParameterStore {
    /// Create a store holding every default
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicU32::new(PARAMS[i].default.to_bits())),
        }
    }

    /// Store a value, clamped to the parameter's range; NaN is ignored
    #[inline]
    pub fn set(&self, id: ParamId, value: f32) {
        if let Some(value) = id.spec().sanitize(value) {
            self.values[id.index()].store(value.to_bits(), Ordering::Release);
        }
    }

    /// Store a value by host address; unknown addresses are ignored
    #[inline]
    pub fn set_raw(&self, raw: u32, value: f32) {
        if let Some(id) = ParamId::from_raw(raw) {
            self.set(id, value);
        }
    }

    /// Latest stored (unsmoothed) value
    #[inline]
    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Acquire))
    }

    /// Toggle parameters as booleans
    #[inline]
    pub fn get_bool(&self, id: ParamId) -> bool {
        self.get(id) >= 0.5
    }

    pub fn snapshot(&self) -> ParameterSnapshot {
        ParameterSnapshot {
            values: ParamId::ALL.iter().map(|&id| (id, self.get(id))).collect(),
        }
    }

    /// Write every value of `snapshot` through the clamping path
    pub fn apply(&self, snapshot: &ParameterSnapshot) {
        for (&id, &value) in &snapshot.values {
            self.set(id, value);
        }
    }

    pub fn reset_to_defaults(&self) {
        for spec in &PARAMS {
            self.values[spec.id.index()].store(spec.default.to_bits(), Ordering::Release);
        }
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(ParamId::ALL.iter().map(|&id| (id.spec().name, self.get(id))))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_table_is_indexed_by_raw_id() {
        for (i, spec) in PARAMS.iter().enumerate() {
            assert_eq!(spec.id.index(), i);
            assert_eq!(ParamId::from_raw(i as u32), Some(spec.id));
            assert!(spec.min <= spec.default && spec.default <= spec.max);
        }
        assert_eq!(ParamId::from_raw(PARAM_COUNT as u32), None);
    }

    #[test]
    fn test_defaults() {
        let store = ParameterStore::new();
        assert_eq!(store.get(ParamId::Threshold), -20.0);
        assert_eq!(store.get(ParamId::Ratio), 4.0);
        assert_eq!(store.get(ParamId::Mix), 100.0);
        assert_eq!(store.get(ParamId::Bite), 25.0);
        assert!(!store.get_bool(ParamId::Bypass));
    }

    #[test]
    fn test_out_of_range_writes_clamp() {
        let store = ParameterStore::new();
        store.set(ParamId::Threshold, -500.0);
        assert_eq!(store.get(ParamId::Threshold), -50.0);
        store.set(ParamId::Ratio, 0.5);
        assert_eq!(store.get(ParamId::Ratio), 1.0);
        store.set(ParamId::Ratio, f32::INFINITY);
        assert_eq!(store.get(ParamId::Ratio), 100.0);
        store.set(ParamId::Mix, 250.0);
        assert_eq!(store.get(ParamId::Mix), 100.0);
    }

    #[test]
    fn test_nan_is_ignored() {
        let store = ParameterStore::new();
        store.set(ParamId::Attack, 25.0);
        store.set(ParamId::Attack, f32::NAN);
        assert_eq!(store.get(ParamId::Attack), 25.0);
    }

    #[test]
    fn test_unknown_raw_id_is_ignored() {
        let store = ParameterStore::new();
        let before = store.snapshot();
        store.set_raw(99, 1.0);
        store.set_raw(u32::MAX, 1.0);
        assert_eq!(store.snapshot(), before);

        store.set_raw(ParamId::Knee.raw(), 6.0);
        assert_eq!(store.get(ParamId::Knee), 6.0);
    }

    #[test]
    fn test_snapshot_serialization() {
        let store = ParameterStore::new();
        store.set(ParamId::Release, 250.0);
        store.set(ParamId::AutoMakeup, 1.0);

        let json = serde_json::to_string(&store.snapshot()).unwrap();
        assert!(json.contains("\"autoMakeup\":1.0"));
        let back: ParameterSnapshot = serde_json::from_str(&json).unwrap();

        let other = ParameterStore::new();
        other.apply(&back);
        assert_eq!(other.get(ParamId::Release), 250.0);
        assert!(other.get_bool(ParamId::AutoMakeup));
    }

    #[test]
    fn test_apply_clamps_and_skips_missing() {
        let store = ParameterStore::new();
        store.set(ParamId::Speed, 40.0);
        let mut partial = ParameterSnapshot::default();
        partial.values.insert(ParamId::Knee, 100.0);
        store.apply(&partial);
        assert_eq!(store.get(ParamId::Knee), 24.0);
        assert_eq!(store.get(ParamId::Speed), 40.0);
    }

    #[test]
    fn test_reset_to_defaults() {
        let store = ParameterStore::new();
        store.set(ParamId::Grip, 80.0);
        store.set(ParamId::Bypass, 1.0);
        store.reset_to_defaults();
        assert_eq!(store.get(ParamId::Grip), 0.0);
        assert!(!store.get_bool(ParamId::Bypass));
    }

    #[test]
    fn test_concurrent_writers_never_tear() {
        let store = Arc::new(ParameterStore::new());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..10_000 {
                    let value = if i % 2 == 0 { -10.0 } else { -40.0 };
                    store.set(ParamId::Threshold, value);
                }
            })
        };
        for _ in 0..10_000 {
            let value = store.get(ParamId::Threshold);
            assert!(value == -10.0 || value == -40.0 || value == -20.0);
        }
        writer.join().unwrap();
    }
}
