//! Look-Ahead Delay
//!
//! Per-channel circular buffers that hold the output path back by a fixed
//! number of samples while the detector already sees the newest input. The
//! delay is fixed at construction: changing it means building a new buffer
//! from the configuration path, never resizing during a render call.

use crate::error::DspError;
use crate::units::millis_to_samples;

/// Longest supported look-ahead
pub const MAX_LOOK_AHEAD_MS: f32 = 20.0;

/// Fixed-length delay line for one channel
///
/// `process` returns the sample written `delay` calls earlier (zeros until
/// the line has filled). A delay of zero passes samples straight through.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    pos: usize,
}

impl DelayLine {
    pub fn new(delay: usize) -> Result<Self, DspError> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(delay)
            .map_err(|_| DspError::AllocationFailed {
                what: "look-ahead",
                samples: delay,
            })?;
        buffer.resize(delay, 0.0);
        Ok(Self { buffer, pos: 0 })
    }

    /// Delay in samples
    #[inline]
    pub fn delay(&self) -> usize {
        self.buffer.len()
    }

    /// Write one sample and read the delayed one
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if self.buffer.is_empty() {
            return input;
        }
        let output = std::mem::replace(&mut self.buffer[self.pos], input);
        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.pos = 0;
        }
        output
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

/// Look-ahead delay for every channel of a stream
#[derive(Debug, Clone)]
pub struct LookAheadBuffer {
    lines: Vec<DelayLine>,
    delay: usize,
}

impl LookAheadBuffer {
    /// Allocate `channels` delay lines of `ceil(ms * sample_rate / 1000)` samples
    ///
    /// This allocates; call it from the configuration path only.
    pub fn new(look_ahead_ms: f32, sample_rate: f32, channels: usize) -> Result<Self, DspError> {
        if !(sample_rate > 0.0 && sample_rate.is_finite()) {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        if !(0.0..=MAX_LOOK_AHEAD_MS).contains(&look_ahead_ms) {
            return Err(DspError::InvalidLookAhead {
                ms: look_ahead_ms,
                max: MAX_LOOK_AHEAD_MS,
            });
        }

        let delay = millis_to_samples(look_ahead_ms, sample_rate);
        let mut lines = Vec::new();
        lines
            .try_reserve_exact(channels)
            .map_err(|_| DspError::AllocationFailed {
                what: "look-ahead channel",
                samples: channels,
            })?;
        for _ in 0..channels {
            lines.push(DelayLine::new(delay)?);
        }
        Ok(Self { lines, delay })
    }

    /// Delay applied to every channel, in samples
    #[inline]
    pub fn delay(&self) -> usize {
        self.delay
    }

    pub fn channels(&self) -> usize {
        self.lines.len()
    }

    /// Delay one sample of `channel`
    ///
    /// # Real-time Safety
    /// No allocations, O(1) time.
    #[inline]
    pub fn process(&mut self, channel: usize, input: f32) -> f32 {
        self.lines[channel].process(input)
    }

    /// Flush every line to silence
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_length_rounds_up() {
        let buffer = LookAheadBuffer::new(5.0, 48000.0, 2).unwrap();
        assert_eq!(buffer.delay(), 240);
        assert_eq!(buffer.channels(), 2);

        let buffer = LookAheadBuffer::new(1.0, 44100.0, 1).unwrap();
        assert_eq!(buffer.delay(), 45);
    }

    #[test]
    fn test_zero_delay_is_passthrough() {
        let mut buffer = LookAheadBuffer::new(0.0, 48000.0, 1).unwrap();
        assert_eq!(buffer.delay(), 0);
        for x in [0.1, -0.7, 0.3] {
            assert_eq!(buffer.process(0, x), x);
        }
    }

    #[test]
    fn test_samples_reappear_exactly_after_delay() {
        let mut buffer = LookAheadBuffer::new(2.0, 48000.0, 2).unwrap();
        let delay = buffer.delay();
        let input: Vec<f32> = (0..2000).map(|i| ((i * 7919) % 1000) as f32 / 1000.0 - 0.5).collect();

        let mut left = Vec::with_capacity(input.len());
        let mut right = Vec::with_capacity(input.len());
        for &x in &input {
            left.push(buffer.process(0, x));
            right.push(buffer.process(1, -x));
        }

        assert!(left[..delay].iter().all(|&s| s == 0.0));
        for n in 0..input.len() - delay {
            assert_eq!(left[n + delay], input[n]);
            assert_eq!(right[n + delay], -input[n]);
        }
    }

    #[test]
    fn test_rejects_out_of_range_look_ahead() {
        assert!(matches!(
            LookAheadBuffer::new(25.0, 48000.0, 2),
            Err(DspError::InvalidLookAhead { .. })
        ));
        assert!(LookAheadBuffer::new(-1.0, 48000.0, 2).is_err());
        assert!(LookAheadBuffer::new(f32::NAN, 48000.0, 2).is_err());
        assert!(LookAheadBuffer::new(5.0, 0.0, 2).is_err());
    }

    #[test]
    fn test_reset_flushes() {
        let mut buffer = LookAheadBuffer::new(1.0, 48000.0, 1).unwrap();
        for _ in 0..10 {
            buffer.process(0, 1.0);
        }
        buffer.reset();
        assert_eq!(buffer.process(0, 0.5), 0.0);
    }
}
