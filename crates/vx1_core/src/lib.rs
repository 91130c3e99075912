//! VX1 Core - Compressor Kernel
//!
//! This crate assembles the `vx1_dsp` building blocks into a host-facing
//! compressor kernel:
//! - Lock-free parameter store shared by control and audio threads
//! - Sample-accurate automation over a wait-free SPSC queue
//! - Planar and interleaved render paths with look-ahead latency reporting
//! - Per-block meter snapshot plus display-side ballistics
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Control Thread                         │
//! │  ParameterStore::set ──┐        AutomationSender::send ──┐  │
//! └────────────────────────┼─────────────────────────────────┼──┘
//!                          │ atomics                   rtrb  │
//!                          ▼                                 ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   Kernel::render ── smoothers ── DSP chain ── output        │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                          │ atomics
//!                          ▼
//!                 MeterSnapshot ──▶ any reader
//! ```

mod automation;
mod config;
mod error;
mod kernel;
mod meter;
mod params;

pub use automation::{queue as automation_queue, AutomationEvent, AutomationReceiver, AutomationSender};
pub use config::{ChannelConfig, KernelConfig, MAX_CHANNELS};
pub use error::{KernelError, KernelResult};
pub use kernel::Kernel;
pub use meter::{MeterBallistics, MeterReading, MeterSnapshot};
pub use params::{ParamId, ParamSpec, ParameterSnapshot, ParameterStore, PARAMS, PARAM_COUNT};

// Re-export DSP types for convenience
pub use vx1_dsp::{AudioProcessor, DetectorLink, ProcessContext};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let config = KernelConfig::default();
        assert!(config.validate().is_ok());
        let (_tx, rx) = automation_queue(4);
        let mut kernel = Kernel::new(DetectorLink::default());
        assert!(kernel.attach_automation(rx).is_none());
        assert!(!kernel.is_prepared());
    }
}
