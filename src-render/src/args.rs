//! Command-line arguments
//!
//! Every argument is `key=value`. Driver keys shape the run; any other key
//! must name a kernel parameter (its camelCase name, e.g. `threshold=-30`,
//! `autoMakeup=1`). Later keys win.

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use vx1_core::{DetectorLink, KernelConfig, ParamId, ParameterSnapshot};

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub config: KernelConfig,
    /// Length of the rendered program
    pub seconds: f32,
    /// Pace blocks at wall-clock speed so the meter thread sees them live
    pub realtime: bool,
    /// Let the control thread sweep the threshold while rendering
    pub sweep: bool,
    /// Engage bypass, sample-accurately, at this many seconds
    pub bypass_at: Option<f32>,
    pub params: ParameterSnapshot,
}

impl Default for RenderArgs {
    fn default() -> Self {
        Self {
            config: KernelConfig::default(),
            seconds: 2.0,
            realtime: true,
            sweep: true,
            bypass_at: None,
            params: ParameterSnapshot::default(),
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<f32> {
    let number: f32 = value
        .parse()
        .with_context(|| format!("{}: '{}' is not a number", key, value))?;
    if !number.is_finite() {
        bail!("{}: value must be finite", key);
    }
    Ok(number)
}

fn parse_integer<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("{}: '{}' is not a whole number", key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => bail!("{}: expected true/false, got '{}'", key, value),
    }
}

fn parse_named<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    serde_json::from_value(Value::String(value.to_string()))
        .with_context(|| format!("{}: unknown value '{}'", key, value))
}

impl RenderArgs {
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Self::default();

        for arg in args {
            let arg = arg.as_ref();
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| anyhow!("expected key=value, got '{}'", arg))?;

            match key {
                "preset" => {
                    parsed.config = match value {
                        "low-latency" => KernelConfig::low_latency(),
                        "stable" => KernelConfig::stable(),
                        "default" => KernelConfig::default(),
                        _ => bail!("preset: unknown preset '{}'", value),
                    }
                }
                "sample_rate" => parsed.config.channel.sample_rate = parse_integer(key, value)?,
                "channels" => parsed.config.channel.channels = parse_integer(key, value)?,
                "block" => parsed.config.channel.max_frames = parse_integer(key, value)?,
                "link" => parsed.config.link = parse_named::<DetectorLink>(key, value)?,
                "seconds" => parsed.seconds = parse_number(key, value)?,
                "realtime" => parsed.realtime = parse_flag(key, value)?,
                "sweep" => parsed.sweep = parse_flag(key, value)?,
                "bypass_at" => parsed.bypass_at = Some(parse_number(key, value)?),
                _ => {
                    let id: ParamId = parse_named(key, key)
                        .map_err(|_| anyhow!("unknown argument '{}'", key))?;
                    parsed.params.values.insert(id, parse_number(key, value)?);
                }
            }
        }

        parsed.config.validate()?;
        if parsed.seconds <= 0.0 {
            bail!("seconds: must be positive");
        }
        if parsed.bypass_at.is_some_and(|at| at < 0.0) {
            bail!("bypass_at: must not be negative");
        }
        Ok(parsed)
    }
}
