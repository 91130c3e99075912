//! Kernel Error Types

use thiserror::Error;

/// Errors reported by the kernel's configuration and render entry points
///
/// Parameter noise never shows up here: out-of-range and NaN values are
/// clamped or ignored at the parameter store.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("Kernel has not been prepared - call prepare() before rendering")]
    NotPrepared,

    #[error("Channel configuration error: {0}")]
    ConfigError(String),

    #[error("Channel count mismatch: kernel prepared for {expected}, got {got}")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("Block of {frames} frames exceeds the prepared maximum of {max_frames}")]
    BlockTooLarge { frames: usize, max_frames: usize },

    #[error("Buffer for channel {channel} holds {len} samples, block needs {frames}")]
    BufferTooShort {
        channel: usize,
        len: usize,
        frames: usize,
    },

    #[error("Failed to allocate {what} ({samples} samples)")]
    AllocationFailed { what: &'static str, samples: usize },

    #[error("Automation queue full - event dropped")]
    QueueFull,

    #[error("DSP error: {0}")]
    DspError(#[from] vx1_dsp::DspError),
}

/// Result type alias for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

impl KernelError {
    /// Lift DSP allocation failures into the kernel's own variant
    pub(crate) fn from_dsp(err: vx1_dsp::DspError) -> Self {
        match err {
            vx1_dsp::DspError::AllocationFailed { what, samples } => {
                KernelError::AllocationFailed { what, samples }
            }
            other => KernelError::DspError(other),
        }
    }
}
