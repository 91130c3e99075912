//! Synthetic test program
//!
//! A repeating cycle of four 250 ms segments: loud tone burst, silence,
//! quiet tone burst, silence. Enough to watch the compressor clamp down,
//! release and let the gate close.

use std::f32::consts::TAU;

use vx1_dsp::units::db_to_gain;

const SEGMENT_MS: f32 = 250.0;
const TONE_HZ: f32 = 220.0;
const LOUD_DB: f32 = -6.0;
const QUIET_DB: f32 = -30.0;

/// Later channels are slightly quieter so linking has something to do
const CHANNEL_STEP_DB: f32 = -2.0;

pub struct Program {
    segment_len: u64,
    phase: f32,
    phase_step: f32,
    frame: u64,
}

impl Program {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            segment_len: ((SEGMENT_MS / 1000.0) * sample_rate).max(1.0) as u64,
            phase: 0.0,
            phase_step: TAU * TONE_HZ / sample_rate,
            frame: 0,
        }
    }

    /// Level of the segment `frame` falls into, `None` for silence
    fn segment_gain(&self, frame: u64) -> Option<f32> {
        match (frame / self.segment_len) % 4 {
            0 => Some(db_to_gain(LOUD_DB)),
            2 => Some(db_to_gain(QUIET_DB)),
            _ => None,
        }
    }

    /// Write the next `frames` frames into every channel buffer
    pub fn fill(&mut self, channels: &mut [Vec<f32>], frames: usize) {
        for i in 0..frames {
            let frame = self.frame + i as u64;
            let tone = match self.segment_gain(frame) {
                Some(gain) => self.phase.sin() * gain,
                None => 0.0,
            };
            for (index, channel) in channels.iter_mut().enumerate() {
                channel[i] = tone * db_to_gain(CHANNEL_STEP_DB * index as f32);
            }
            self.phase = (self.phase + self.phase_step) % TAU;
        }
        self.frame += frames as u64;
    }

    /// Frames generated so far
    pub fn position(&self) -> u64 {
        self.frame
    }
}
