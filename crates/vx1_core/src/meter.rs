//! Meter Snapshot
//!
//! The kernel publishes one set of block statistics after every non-empty
//! render call; any thread may read them at any time. Values are f32 bits in
//! atomics (the `SharedState` pattern), plus a block counter that tells a
//! poller whether anything new has been rendered.
//!
//! The kernel never smooths or decays these values. Display ballistics are
//! the reader's business; [`MeterBallistics`] is a ready-made helper.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use vx1_dsp::units::gain_to_db;

/// Latest block statistics, written by the audio thread
pub struct MeterSnapshot {
    gain_reduction_bits: AtomicU32,
    gate_reduction_bits: AtomicU32,
    output_peak_bits: AtomicU32,
    blocks: AtomicU64,
}

impl MeterSnapshot {
    pub fn new() -> Self {
        Self {
            gain_reduction_bits: AtomicU32::new(0.0_f32.to_bits()),
            gate_reduction_bits: AtomicU32::new(0.0_f32.to_bits()),
            output_peak_bits: AtomicU32::new(0.0_f32.to_bits()),
            blocks: AtomicU64::new(0),
        }
    }

    /// Publish one block's statistics
    ///
    /// # Real-time Safety
    /// Four atomic stores, no allocations.
    #[inline]
    pub(crate) fn publish(&self, gain_reduction_db: f32, gate_reduction_db: f32, output_peak: f32) {
        self.gain_reduction_bits
            .store(gain_reduction_db.max(0.0).to_bits(), Ordering::Relaxed);
        self.gate_reduction_bits
            .store(gate_reduction_db.max(0.0).to_bits(), Ordering::Relaxed);
        self.output_peak_bits
            .store(output_peak.to_bits(), Ordering::Relaxed);
        // Release pairs with the Acquire in `blocks()` so a reader that sees
        // the new count also sees the values above
        self.blocks.fetch_add(1, Ordering::Release);
    }

    /// Return every value to its initial state
    pub(crate) fn clear(&self) {
        self.gain_reduction_bits.store(0.0_f32.to_bits(), Ordering::Relaxed);
        self.gate_reduction_bits.store(0.0_f32.to_bits(), Ordering::Relaxed);
        self.output_peak_bits.store(0.0_f32.to_bits(), Ordering::Relaxed);
        self.blocks.fetch_add(1, Ordering::Release);
    }

    /// Peak compressor gain reduction of the last block, in dB (>= 0)
    pub fn current_gain_reduction_db(&self) -> f32 {
        f32::from_bits(self.gain_reduction_bits.load(Ordering::Relaxed))
    }

    /// Peak gate attenuation of the last block, in dB (>= 0)
    pub fn gate_reduction_db(&self) -> f32 {
        f32::from_bits(self.gate_reduction_bits.load(Ordering::Relaxed))
    }

    /// Peak absolute output sample of the last block
    pub fn output_peak(&self) -> f32 {
        f32::from_bits(self.output_peak_bits.load(Ordering::Relaxed))
    }

    /// Number of blocks published so far
    pub fn blocks(&self) -> u64 {
        self.blocks.load(Ordering::Acquire)
    }

    /// All values at once
    pub fn reading(&self) -> MeterReading {
        let block = self.blocks();
        let output_peak = self.output_peak();
        MeterReading {
            block,
            gain_reduction_db: self.current_gain_reduction_db(),
            gate_reduction_db: self.gate_reduction_db(),
            output_peak,
            output_peak_db: gain_to_db(output_peak),
        }
    }
}

impl Default for MeterSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of the meter, for display and logging
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterReading {
    pub block: u64,
    pub gain_reduction_db: f32,
    pub gate_reduction_db: f32,
    pub output_peak: f32,
    pub output_peak_db: f32,
}

/// Fast attack, tiered release
const ATTACK_COEFF: f32 = 0.3;
const LIGHT_RELEASE_COEFF: f32 = 0.5;
const HEAVY_RELEASE_COEFF: f32 = 0.95;
const SNAP_TO_ZERO_DB: f32 = 0.05;

/// Display-side smoothing of the gain-reduction meter
///
/// Call [`poll`](Self::poll) at the display rate. Rises follow quickly,
/// falls release slowly while compression is heavy and faster near zero.
/// If the block counter stops moving for `stale_polls` consecutive polls
/// (transport stopped, host no longer rendering) the display drops to zero
/// instead of freezing on the last value.
#[derive(Debug, Clone)]
pub struct MeterBallistics {
    displayed_db: f32,
    last_block: Option<u64>,
    unchanged_polls: u32,
    stale_polls: u32,
}

impl MeterBallistics {
    pub fn new(stale_polls: u32) -> Self {
        Self {
            displayed_db: 0.0,
            last_block: None,
            unchanged_polls: 0,
            stale_polls: stale_polls.max(1),
        }
    }

    /// Read the snapshot and advance the display by one poll
    pub fn poll(&mut self, meter: &MeterSnapshot) -> f32 {
        self.update(&meter.reading())
    }

    /// Advance the display with an already-taken reading
    pub fn update(&mut self, reading: &MeterReading) -> f32 {
        let target = if self.last_block == Some(reading.block) {
            self.unchanged_polls = self.unchanged_polls.saturating_add(1);
            if self.unchanged_polls >= self.stale_polls {
                0.0
            } else {
                reading.gain_reduction_db
            }
        } else {
            self.unchanged_polls = 0;
            self.last_block = Some(reading.block);
            reading.gain_reduction_db
        };

        self.displayed_db = if target > self.displayed_db {
            ATTACK_COEFF * self.displayed_db + (1.0 - ATTACK_COEFF) * target
        } else if target < SNAP_TO_ZERO_DB {
            0.0
        } else if target < 1.0 {
            LIGHT_RELEASE_COEFF * self.displayed_db + (1.0 - LIGHT_RELEASE_COEFF) * target
        } else {
            HEAVY_RELEASE_COEFF * self.displayed_db + (1.0 - HEAVY_RELEASE_COEFF) * target
        };
        self.displayed_db
    }

    pub fn displayed_db(&self) -> f32 {
        self.displayed_db
    }

    /// Whether the last poll found the kernel silent for too long
    pub fn is_stale(&self) -> bool {
        self.unchanged_polls >= self.stale_polls
    }
}

impl Default for MeterBallistics {
    fn default() -> Self {
        Self::new(10)
    }
}
