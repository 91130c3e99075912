//! VX1 Render - Offline Render Driver
//!
//! Drives the compressor kernel the way a plugin host would:
//!
//! ```text
//!   control thread ──ParameterStore──┐
//!                                    ▼
//!   render thread ── automation ──▶ Kernel::render ──▶ MeterSnapshot
//!                                                          │ poll
//!   meter thread ── MeterBallistics ──crossbeam──▶ main ──▶ stdout (JSON lines)
//! ```
//!
//! Usage: `vx1_render [key=value ...]`, e.g.
//! `vx1_render threshold=-30 ratio=8 lookAhead=5 bypass_at=1.5`.
//! Logs go to stderr; `RUST_LOG` overrides the default filter.

mod args;
mod program;

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Sender};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use vx1_core::{
    automation_queue, AutomationEvent, AutomationSender, ChannelConfig, Kernel, KernelResult,
    MeterBallistics, MeterReading, MeterSnapshot, ParamId, ParameterSnapshot, ParameterStore,
    MAX_CHANNELS,
};
use vx1_dsp::units::gain_to_db;

use crate::args::RenderArgs;
use crate::program::Program;

const METER_POLL: Duration = Duration::from_millis(20);
const SWEEP_STEP: Duration = Duration::from_millis(50);

/// One line of output
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Report {
    Meter {
        #[serde(flatten)]
        reading: MeterReading,
        displayed_db: f32,
    },
    Summary {
        frames: u64,
        latency_samples: usize,
        output_peak_db: f32,
        params: ParameterSnapshot,
    },
}

/// What the render thread hands back
struct RenderStats {
    frames: u64,
    latency_samples: usize,
    output_peak: f32,
}

fn render_program(
    mut kernel: Kernel,
    mut automation: AutomationSender,
    args: &RenderArgs,
) -> Result<RenderStats> {
    let channel: ChannelConfig = args.config.channel;
    let sample_rate = channel.sample_rate_f32();
    let block = channel.max_block();
    let total = (args.seconds * sample_rate).ceil() as u64;
    let bypass_frame = args.bypass_at.map(|at| (at * sample_rate) as u64);
    let block_time = Duration::from_secs_f32(channel.block_ms() / 1000.0);

    let mut program = Program::new(sample_rate);
    let mut input = vec![vec![0.0_f32; block]; channel.channel_count()];
    let mut output = input.clone();
    let mut output_peak = 0.0_f32;

    info!(
        "Rendering {} frames ({:.2} s) in blocks of {}, latency {} samples",
        total,
        args.seconds,
        block,
        kernel.latency_samples()
    );

    while program.position() < total {
        let start = program.position();
        let frames = (total - start).min(block as u64) as usize;

        if let Some(at) = bypass_frame {
            if (start..start + frames as u64).contains(&at) {
                let offset = (at - start) as u32;
                automation.send(AutomationEvent::new(offset, ParamId::Bypass, 1.0))?;
                debug!("Bypass scheduled at frame {}", at);
            }
        }

        program.fill(&mut input, frames);
        let peak = render_block(&mut kernel, &input, &mut output, frames)
            .with_context(|| format!("render failed at frame {}", start))?;
        output_peak = output_peak.max(peak);

        if args.realtime {
            thread::sleep(block_time);
        }
    }

    Ok(RenderStats {
        frames: program.position(),
        latency_samples: kernel.latency_samples(),
        output_peak,
    })
}

/// Render the first `frames` frames of every channel and return the output peak
///
/// The channel views live on the stack, so a block costs no allocation.
fn render_block(
    kernel: &mut Kernel,
    input: &[Vec<f32>],
    output: &mut [Vec<f32>],
    frames: usize,
) -> KernelResult<f32> {
    let channels = input.len().min(MAX_CHANNELS);
    let mut inputs: [&[f32]; MAX_CHANNELS] = [&[]; MAX_CHANNELS];
    for (view, ch) in inputs.iter_mut().zip(input) {
        *view = &ch[..frames];
    }
    let mut outputs: [&mut [f32]; MAX_CHANNELS] = Default::default();
    for (view, ch) in outputs.iter_mut().zip(output.iter_mut()) {
        *view = &mut ch[..frames];
    }
    kernel.render(&inputs[..channels], &mut outputs[..channels], frames)?;

    Ok(outputs[..channels]
        .iter()
        .flat_map(|ch| ch.iter())
        .fold(0.0_f32, |acc, s| acc.max(s.abs())))
}

/// Slowly sweep the threshold down 20 dB and back while the render runs
fn sweep_threshold(params: &ParameterStore, running: &AtomicBool) {
    let start = params.get(ParamId::Threshold);
    let spec = ParamId::Threshold.spec();
    let mut step = 0_u32;
    while running.load(Ordering::Acquire) {
        // Triangle over 40 steps
        let position = (step % 40) as f32 / 20.0;
        let depth = if position <= 1.0 { position } else { 2.0 - position };
        params.set(ParamId::Threshold, (start - 20.0 * depth).max(spec.min));
        step = step.wrapping_add(1);
        thread::sleep(SWEEP_STEP);
    }
    params.set(ParamId::Threshold, start);
}

fn poll_meter(meter: &MeterSnapshot, running: &AtomicBool, reports: &Sender<Report>) {
    let mut ballistics = MeterBallistics::default();
    let mut last_block = None;
    while running.load(Ordering::Acquire) {
        let reading = meter.reading();
        let displayed_db = ballistics.update(&reading);
        if last_block != Some(reading.block) {
            last_block = Some(reading.block);
            if reports
                .send(Report::Meter {
                    reading,
                    displayed_db,
                })
                .is_err()
            {
                break;
            }
        }
        thread::sleep(METER_POLL);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vx1_core=info,vx1_render=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = RenderArgs::parse(std::env::args().skip(1))?;

    let params = Arc::new(ParameterStore::new());
    params.apply(&args.params);
    let mut kernel = Kernel::with_params(Arc::clone(&params), args.config.link);
    let (automation, receiver) = automation_queue(args.config.automation_capacity);
    kernel.attach_automation(receiver);
    kernel.prepare(&args.config.channel)?;
    let meter = Arc::clone(kernel.meter());

    let running = Arc::new(AtomicBool::new(true));
    let (report_tx, report_rx) = bounded::<Report>(64);

    let render_handle = {
        let running = Arc::clone(&running);
        let args = args.clone();
        thread::Builder::new()
            .name("vx1-render".into())
            .spawn(move || {
                let result = render_program(kernel, automation, &args);
                running.store(false, Ordering::Release);
                result
            })
            .context("Failed to spawn render thread")?
    };

    let control_handle = if args.sweep {
        let running = Arc::clone(&running);
        let params = Arc::clone(&params);
        Some(
            thread::Builder::new()
                .name("vx1-control".into())
                .spawn(move || sweep_threshold(&params, &running))
                .context("Failed to spawn control thread")?,
        )
    } else {
        None
    };

    let meter_handle = {
        let running = Arc::clone(&running);
        thread::Builder::new()
            .name("vx1-meter".into())
            .spawn(move || poll_meter(&meter, &running, &report_tx))
            .context("Failed to spawn meter thread")?
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for report in report_rx.iter() {
        serde_json::to_writer(&mut out, &report)?;
        writeln!(out)?;
    }

    let stats = render_handle
        .join()
        .map_err(|_| anyhow!("render thread panicked"))??;
    if let Some(handle) = control_handle {
        if handle.join().is_err() {
            warn!("Control thread panicked");
        }
    }
    if meter_handle.join().is_err() {
        warn!("Meter thread panicked");
    }

    let summary = Report::Summary {
        frames: stats.frames,
        latency_samples: stats.latency_samples,
        output_peak_db: gain_to_db(stats.output_peak),
        params: params.snapshot(),
    };
    serde_json::to_writer(&mut out, &summary)?;
    writeln!(out)?;

    info!("Render complete: {} frames", stats.frames);
    Ok(())
}
