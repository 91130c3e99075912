//! Kernel and Channel Configuration

use serde::{Deserialize, Serialize};
use vx1_dsp::DetectorLink;

use crate::error::{KernelError, KernelResult};

/// Most channels one kernel can be prepared for
pub const MAX_CHANNELS: usize = 8;

/// Shape of the audio the kernel is prepared for
///
/// Fixed between two `prepare` calls; every per-channel buffer is sized
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Largest block the host will ever render in one call
    pub max_frames: u32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            max_frames: 512,
        }
    }
}

impl ChannelConfig {
    pub fn new(sample_rate: u32, channels: u16, max_frames: u32) -> Self {
        Self {
            sample_rate,
            channels,
            max_frames,
        }
    }

    /// Sample rate as the DSP units take it
    pub fn sample_rate_f32(&self) -> f32 {
        self.sample_rate as f32
    }

    pub fn channel_count(&self) -> usize {
        self.channels as usize
    }

    pub fn max_block(&self) -> usize {
        self.max_frames as usize
    }

    /// Duration of a full block in milliseconds
    pub fn block_ms(&self) -> f32 {
        (self.max_frames as f32 / self.sample_rate as f32) * 1000.0
    }

    pub fn validate(&self) -> KernelResult<()> {
        if !(8000..=384_000).contains(&self.sample_rate) {
            return Err(KernelError::ConfigError(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if self.channels == 0 || self.channel_count() > MAX_CHANNELS {
            return Err(KernelError::ConfigError(format!(
                "Invalid channel count: {}",
                self.channels
            )));
        }
        if self.max_frames == 0 || self.max_frames > 8192 {
            return Err(KernelError::ConfigError(format!(
                "Invalid maximum block size: {}",
                self.max_frames
            )));
        }
        Ok(())
    }
}

/// Everything needed to build a ready-to-render kernel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    pub channel: ChannelConfig,

    /// How channels share the detector
    #[serde(default)]
    pub link: DetectorLink,

    /// Capacity of the sample-accurate automation queue, in events
    pub automation_capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            channel: ChannelConfig::default(),
            link: DetectorLink::default(),
            automation_capacity: 256,
        }
    }
}

impl KernelConfig {
    /// Small blocks, for live monitoring
    pub fn low_latency() -> Self {
        Self {
            channel: ChannelConfig::new(48000, 2, 128),
            link: DetectorLink::LinkedMax,
            automation_capacity: 128,
        }
    }

    /// Large blocks, for mixdown and offline rendering
    pub fn stable() -> Self {
        Self {
            channel: ChannelConfig::new(48000, 2, 2048),
            link: DetectorLink::LinkedMax,
            automation_capacity: 1024,
        }
    }

    pub fn validate(&self) -> KernelResult<()> {
        self.channel.validate()?;
        if self.automation_capacity == 0 {
            return Err(KernelError::ConfigError(
                "Automation queue needs room for at least one event".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChannelConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channels, 2);
        assert_eq!(config.max_frames, 512);
        assert!(KernelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_block_duration() {
        let config = ChannelConfig::new(48000, 2, 480);
        assert!((config.block_ms() - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_validation() {
        assert!(ChannelConfig::new(100, 2, 512).validate().is_err());
        assert!(ChannelConfig::new(48000, 0, 512).validate().is_err());
        assert!(ChannelConfig::new(48000, 9, 512).validate().is_err());
        assert!(ChannelConfig::new(48000, 2, 0).validate().is_err());
        assert!(ChannelConfig::new(192000, 1, 8192).validate().is_ok());

        let no_queue = KernelConfig {
            automation_capacity: 0,
            ..Default::default()
        };
        assert!(no_queue.validate().is_err());
    }

    #[test]
    fn test_preset_configs() {
        let low_latency = KernelConfig::low_latency();
        let stable = KernelConfig::stable();
        assert!(low_latency.channel.max_frames < stable.channel.max_frames);
        assert!(low_latency.channel.block_ms() < stable.channel.block_ms());
    }

    #[test]
    fn test_config_serialization() {
        let config = KernelConfig::stable();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"linked-max\""));
        let back: KernelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.channel, config.channel);
        assert_eq!(back.link, config.link);
    }

    #[test]
    fn test_link_defaults_when_missing() {
        let json = r#"{"channel":{"sample_rate":44100,"channels":1,"max_frames":256},"automation_capacity":16}"#;
        let config: KernelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.link, DetectorLink::LinkedMax);
        assert_eq!(config.channel.sample_rate, 44100);
    }
}
