//! Audio Processor Trait
//!
//! Interleaved, in-place processing interface for hosts and drivers that
//! hand over a single `[L0, R0, L1, R1, ...]` buffer per callback.

/// Stream metadata passed alongside every buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    pub sample_rate: f32,
    pub channels: usize,
    pub buffer_size: usize,
}

impl ProcessContext {
    pub fn new(sample_rate: f32, channels: usize, buffer_size: usize) -> Self {
        Self {
            sample_rate,
            channels,
            buffer_size,
        }
    }

    /// Frames contained in an interleaved buffer of `samples` values
    #[inline]
    pub fn frames_in(&self, samples: usize) -> usize {
        if self.channels == 0 {
            0
        } else {
            samples / self.channels
        }
    }
}

/// Trait for in-place audio processors
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
///
/// Violating these rules causes audio dropouts ("glitches").
pub trait AudioProcessor: Send {
    /// Process an interleaved buffer in place
    fn process(&mut self, buffer: &mut [f32], context: &ProcessContext);

    /// Reset internal state (delay lines, envelopes, etc.)
    fn reset(&mut self);

    /// Human-readable name for logs
    fn name(&self) -> &'static str;

    /// Whether this processor is currently enabled
    fn is_enabled(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Halve;

    impl AudioProcessor for Halve {
        fn process(&mut self, buffer: &mut [f32], _context: &ProcessContext) {
            for sample in buffer.iter_mut() {
                *sample *= 0.5;
            }
        }

        fn reset(&mut self) {}

        fn name(&self) -> &'static str {
            "Halve"
        }
    }

    #[test]
    fn test_process_context() {
        let ctx = ProcessContext::new(48000.0, 2, 512);
        assert_eq!(ctx.sample_rate, 48000.0);
        assert_eq!(ctx.frames_in(1024), 512);
        assert_eq!(ProcessContext::new(48000.0, 0, 512).frames_in(16), 0);
    }

    #[test]
    fn test_trait_object_dispatch() {
        let mut processor: Box<dyn AudioProcessor> = Box::new(Halve);
        let mut buffer = [1.0, -1.0];
        processor.process(&mut buffer, &ProcessContext::new(48000.0, 2, 1));
        assert_eq!(buffer, [0.5, -0.5]);
        assert!(processor.is_enabled());
        assert_eq!(processor.name(), "Halve");
    }
}
