//! Compressor Kernel
//!
//! The audio-rate render path. Per frame:
//!
//! ```text
//! automation due at this frame -> smoothers
//!   input ──┬──▶ detector ─▶ envelope ─▶ gain computer (+stack) ─┐
//!           │                         └▶ gate ───────── max ─────┤
//!           └──▶ look-ahead delay ─▶ Grip ─▶ × gain ─▶ Bite ─▶ Sheen ─▶ × makeup
//!                        │                                              │
//!                        └──────────── dry ──────── mix ◀───────────────┘
//!                                                    │
//!                                           bypass crossfade ─▶ output
//! ```
//!
//! The detector always sees the newest input while the signal path reads
//! the delayed copy, so gain moves ahead of transients by exactly the
//! reported latency.
//!
//! # Real-time Safety
//!
//! `prepare` is the only method that allocates. `render`, `reset` and the
//! [`AudioProcessor`] implementation never allocate, lock or block.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vx1_dsp::units::{db_to_gain, gain_to_db};
use vx1_dsp::{
    mixer, AudioProcessor, ColorAmounts, ColorationChain, DetectorLink, DspError, EnvelopeFollower,
    EqualPowerFade, GainComputer, Gate, LevelDetector, LinearSmoother, LookAheadBuffer,
    MakeupMode, ProcessContext, ProgramRelease,
};

use crate::automation::{self, AutomationReceiver, AutomationSender};
use crate::config::{ChannelConfig, KernelConfig};
use crate::error::{KernelError, KernelResult};
use crate::meter::MeterSnapshot;
use crate::params::{ParamId, ParameterStore, PARAM_COUNT};

/// Where the kernel reads input samples and writes output samples
trait BlockIo {
    fn read(&self, channel: usize, frame: usize) -> f32;
    fn write(&mut self, channel: usize, frame: usize, value: f32);
}

/// Separate input and output buffers, one slice per channel
struct Planar<'a, 'b, 'c, 'd> {
    inputs: &'a [&'b [f32]],
    outputs: &'c mut [&'d mut [f32]],
}

impl BlockIo for Planar<'_, '_, '_, '_> {
    #[inline]
    fn read(&self, channel: usize, frame: usize) -> f32 {
        self.inputs[channel][frame]
    }

    #[inline]
    fn write(&mut self, channel: usize, frame: usize, value: f32) {
        self.outputs[channel][frame] = value;
    }
}

/// One interleaved buffer processed in place, starting `offset` frames in
struct Interleaved<'a> {
    buffer: &'a mut [f32],
    channels: usize,
    offset: usize,
}

impl BlockIo for Interleaved<'_> {
    #[inline]
    fn read(&self, channel: usize, frame: usize) -> f32 {
        self.buffer[(self.offset + frame) * self.channels + channel]
    }

    #[inline]
    fn write(&mut self, channel: usize, frame: usize, value: f32) {
        self.buffer[(self.offset + frame) * self.channels + channel] = value;
    }
}

/// Envelope, release history and gate of one detector lane
struct Lane {
    envelope: EnvelopeFollower,
    program: ProgramRelease,
    gate: Gate,
    release_ms: f32,
}

impl Lane {
    fn new(attack_ms: f32, release_ms: f32, sample_rate: f32) -> Self {
        Self {
            envelope: EnvelopeFollower::new(attack_ms, release_ms, sample_rate),
            program: ProgramRelease::new(sample_rate),
            gate: Gate::new(sample_rate),
            release_ms,
        }
    }

    #[inline]
    fn set_release(&mut self, release_ms: f32, sample_rate: f32) {
        if release_ms != self.release_ms {
            self.envelope.set_release(release_ms, sample_rate);
            self.release_ms = release_ms;
        }
    }

    fn reset(&mut self) {
        self.envelope.reset();
        self.program.reset();
        self.gate.reset();
    }
}

fn try_collect<T>(
    len: usize,
    what: &'static str,
    mut make: impl FnMut() -> Result<T, DspError>,
) -> Result<Vec<T>, DspError> {
    let mut items = Vec::new();
    items
        .try_reserve_exact(len)
        .map_err(|_| DspError::AllocationFailed { what, samples: len })?;
    for _ in 0..len {
        items.push(make()?);
    }
    Ok(items)
}

/// Everything sized by `prepare`
struct Prepared {
    config: ChannelConfig,
    sample_rate: f32,
    look_ahead_ms: f32,
    detector: LevelDetector,
    lanes: Vec<Lane>,
    delay: LookAheadBuffer,
    coloration: Vec<ColorationChain>,
    smoothers: [LinearSmoother; PARAM_COUNT],
    bypass: EqualPowerFade,
    bypass_idle: bool,
    attack_ms: f32,
    frame: Vec<f32>,
    levels: Vec<f32>,
    gains: Vec<f32>,
}

impl Prepared {
    fn new(
        config: &ChannelConfig,
        link: DetectorLink,
        look_ahead_ms: f32,
        params: &ParameterStore,
    ) -> Result<Self, DspError> {
        let sample_rate = config.sample_rate_f32();
        let channels = config.channel_count();
        let attack_ms = params.get(ParamId::Attack);
        let release_ms = params.get(ParamId::Release);

        let detector = LevelDetector::new(link, channels, sample_rate)?;
        let lane_count = detector.lanes();
        let lanes = try_collect(lane_count, "detector lane", || {
            Ok(Lane::new(attack_ms, release_ms, sample_rate))
        })?;
        let delay = LookAheadBuffer::new(look_ahead_ms, sample_rate, channels)?;
        let coloration = try_collect(channels, "coloration", || ColorationChain::new(sample_rate))?;

        Ok(Self {
            config: *config,
            sample_rate,
            look_ahead_ms,
            detector,
            lanes,
            delay,
            coloration,
            smoothers: std::array::from_fn(|i| {
                LinearSmoother::new(smoothing_target(params, ParamId::ALL[i]), sample_rate)
            }),
            bypass: EqualPowerFade::new(params.get_bool(ParamId::Bypass), sample_rate),
            bypass_idle: false,
            attack_ms,
            frame: try_collect(channels, "frame", || Ok(0.0))?,
            levels: try_collect(lane_count, "level", || Ok(0.0))?,
            gains: try_collect(lane_count, "gain", || Ok(1.0))?,
        })
    }

    /// Point one smoother (or the bypass fade) at the stored value
    #[inline]
    fn retarget(&mut self, params: &ParameterStore, id: ParamId) {
        match id {
            ParamId::Bypass => self.bypass.set_engaged(params.get_bool(id)),
            // Latched at prepare
            ParamId::LookAhead => {}
            _ => self.smoothers[id.index()].set_target(smoothing_target(params, id)),
        }
    }

    #[inline]
    fn advance_smoothers(&mut self) -> [f32; PARAM_COUNT] {
        let smoothers = &mut self.smoothers;
        std::array::from_fn(|i| smoothers[i].next())
    }

    /// Clear envelopes, gates and filters; the delay line keeps running
    fn clear_dynamics(&mut self) {
        self.detector.reset();
        for lane in &mut self.lanes {
            lane.reset();
        }
        for chain in &mut self.coloration {
            chain.reset();
        }
    }

    fn reset(&mut self, params: &ParameterStore) {
        self.clear_dynamics();
        self.delay.reset();
        for (smoother, id) in self.smoothers.iter_mut().zip(ParamId::ALL) {
            smoother.reset(smoothing_target(params, id));
        }
        self.bypass.reset(params.get_bool(ParamId::Bypass));
        self.bypass_idle = false;
    }

    fn process<B: BlockIo>(
        &mut self,
        io: &mut B,
        frames: usize,
        params: &ParameterStore,
        mut automation: Option<&mut AutomationReceiver>,
        meter: &MeterSnapshot,
    ) {
        for id in ParamId::ALL {
            self.retarget(params, id);
        }
        if let Some(rx) = automation.as_deref_mut() {
            rx.begin_block();
        }

        let channels = self.config.channel_count();
        let sample_rate = self.sample_rate;
        let shared_lane = self.lanes.len() == 1;
        let mut peak_reduction = 0.0_f32;
        let mut peak_gate = 0.0_f32;
        let mut peak_out = 0.0_f32;

        for i in 0..frames {
            if let Some(rx) = automation.as_deref_mut() {
                while let Some(event) = rx.next_due(i) {
                    params.set(event.param, event.value);
                    self.retarget(params, event.param);
                }
            }

            for (channel, slot) in self.frame.iter_mut().enumerate() {
                let x = io.read(channel, i);
                *slot = if x.is_finite() { x } else { 0.0 };
            }

            let values = self.advance_smoothers();
            let (process_gain, bypass_gain) = self.bypass.next();

            if self.bypass.is_fully_engaged() {
                if !self.bypass_idle {
                    self.clear_dynamics();
                    self.bypass_idle = true;
                }
                for channel in 0..channels {
                    let dry = self.delay.process(channel, self.frame[channel]);
                    io.write(channel, i, dry);
                    peak_out = peak_out.max(dry.abs());
                }
                continue;
            }
            self.bypass_idle = false;

            let value = |id: ParamId| values[id.index()];
            let curve = GainComputer::from_controls(
                value(ParamId::Threshold),
                value(ParamId::Ratio),
                value(ParamId::Knee),
                value(ParamId::Compress),
            );
            let stack = value(ParamId::Stack) / 100.0;
            let speed = value(ParamId::Speed) / 100.0;
            let release_ms = value(ParamId::Release);
            let gate_threshold = value(ParamId::GateThreshold);

            let attack_ms = value(ParamId::Attack);
            if attack_ms != self.attack_ms {
                for lane in &mut self.lanes {
                    lane.envelope.set_attack(attack_ms, sample_rate);
                }
                self.attack_ms = attack_ms;
            }

            self.detector
                .detect(&self.frame, value(ParamId::Detection) / 100.0, &mut self.levels);

            for ((lane, &level), gain) in self
                .lanes
                .iter_mut()
                .zip(self.levels.iter())
                .zip(self.gains.iter_mut())
            {
                lane.set_release(lane.program.effective_release_ms(release_ms, speed), sample_rate);
                let level_db = gain_to_db(lane.envelope.process(level));
                let reduction = curve.stacked_reduction_db(level_db, stack);
                let gate = lane.gate.process(level_db, gate_threshold);
                lane.program.update(reduction);

                peak_reduction = peak_reduction.max(reduction);
                peak_gate = peak_gate.max(gate);
                *gain = db_to_gain(-reduction.max(gate));
            }

            // Auto and manual crossfade while the toggle ramps, never sum
            let makeup_db = mixer::mix(
                MakeupMode::Manual(value(ParamId::MakeupGain)).gain_db(&curve),
                MakeupMode::Auto.gain_db(&curve),
                value(ParamId::AutoMakeup),
            );
            let makeup = db_to_gain(makeup_db);
            let amounts = ColorAmounts {
                grip: value(ParamId::Grip) / 100.0,
                bite: value(ParamId::Bite) / 100.0,
                sheen: value(ParamId::Sheen) / 100.0,
            };
            let wet_share = value(ParamId::Mix) / 100.0;

            for channel in 0..channels {
                let dry = self.delay.process(channel, self.frame[channel]);
                let gain = self.gains[if shared_lane { 0 } else { channel }];
                let chain = &mut self.coloration[channel];

                let gained = chain.pre_gain(dry, &amounts) * gain;
                let wet = chain.post_gain(gained, &amounts) * makeup;
                let mixed = mixer::mix(dry, wet, wet_share);

                let out = if self.bypass.is_fully_released() {
                    mixed
                } else {
                    mixed * process_gain + dry * bypass_gain
                };
                let out = if out.is_finite() { out } else { 0.0 };
                io.write(channel, i, out);
                peak_out = peak_out.max(out.abs());
            }
        }

        if let Some(rx) = automation {
            rx.end_block(frames);
        }
        meter.publish(peak_reduction, peak_gate, peak_out);
    }
}

/// Value a parameter's smoother ramps toward
///
/// Toggles ramp between exactly 0 and 1 so an in-between stored value
/// never blends their two states.
#[inline]
fn smoothing_target(params: &ParameterStore, id: ParamId) -> f32 {
    if id.is_toggle() {
        if params.get_bool(id) {
            1.0
        } else {
            0.0
        }
    } else {
        params.get(id)
    }
}

/// Real-time compressor kernel
///
/// Owns all DSP state. The control side shares the parameter store, the
/// meter snapshot and (optionally) the sending half of an automation queue.
/// Any number of kernels can coexist; nothing is global.
pub struct Kernel {
    params: Arc<ParameterStore>,
    meter: Arc<MeterSnapshot>,
    link: DetectorLink,
    automation: Option<AutomationReceiver>,
    state: Option<Prepared>,
}

impl Kernel {
    /// Create an unprepared kernel with a fresh, default parameter store
    pub fn new(link: DetectorLink) -> Self {
        Self::with_params(Arc::new(ParameterStore::new()), link)
    }

    /// Create an unprepared kernel reading from an existing parameter store
    pub fn with_params(params: Arc<ParameterStore>, link: DetectorLink) -> Self {
        Self {
            params,
            meter: Arc::new(MeterSnapshot::new()),
            link,
            automation: None,
            state: None,
        }
    }

    /// Build, connect and prepare a kernel in one step
    ///
    /// Returns the kernel together with the sending half of its automation
    /// queue.
    pub fn from_config(config: &KernelConfig) -> KernelResult<(Self, AutomationSender)> {
        config.validate()?;
        let mut kernel = Self::new(config.link);
        let (sender, receiver) = automation::queue(config.automation_capacity);
        kernel.attach_automation(receiver);
        kernel.prepare(&config.channel)?;
        Ok((kernel, sender))
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    pub fn meter(&self) -> &Arc<MeterSnapshot> {
        &self.meter
    }

    pub fn link(&self) -> DetectorLink {
        self.link
    }

    /// Connect the audio-thread half of an automation queue
    ///
    /// Returns the previously attached receiver, if any.
    pub fn attach_automation(&mut self, receiver: AutomationReceiver) -> Option<AutomationReceiver> {
        debug!("Automation queue attached");
        self.automation.replace(receiver)
    }

    /// Size every buffer for `config` and reset all state
    ///
    /// Reads the look-ahead parameter and latches it until the next call.
    /// Calling again with the same configuration and an unchanged look-ahead
    /// keeps the running state. On failure the kernel is left unprepared.
    pub fn prepare(&mut self, config: &ChannelConfig) -> KernelResult<()> {
        config.validate()?;
        let look_ahead_ms = self.params.get(ParamId::LookAhead);

        if let Some(state) = &self.state {
            if state.config == *config && state.look_ahead_ms == look_ahead_ms {
                debug!("prepare() with unchanged configuration - keeping state");
                return Ok(());
            }
        }

        // Release the old buffers before allocating the new ones
        self.state = None;
        let state = Prepared::new(config, self.link, look_ahead_ms, &self.params).map_err(|e| {
            warn!("Kernel preparation failed: {}", e);
            KernelError::from_dsp(e)
        })?;

        info!(
            "Kernel prepared: {} Hz, {} channel(s), {} frames max, {} detection, {} samples latency",
            config.sample_rate,
            config.channels,
            config.max_frames,
            self.link.name(),
            state.delay.delay()
        );

        self.state = Some(state);
        if let Some(rx) = self.automation.as_mut() {
            rx.clear();
        }
        self.meter.clear();
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.state.is_some()
    }

    /// Configuration of the last successful `prepare`
    pub fn channel_config(&self) -> Option<ChannelConfig> {
        self.state.as_ref().map(|state| state.config)
    }

    /// Render `frames` frames from planar `inputs` into planar `outputs`
    ///
    /// Shape errors are reported before any sample is touched. A zero-frame
    /// call does nothing.
    ///
    /// # Real-time Safety
    /// No allocations, no locks; O(channels × frames).
    pub fn render(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        frames: usize,
    ) -> KernelResult<()> {
        let state = self.state.as_mut().ok_or(KernelError::NotPrepared)?;
        if frames == 0 {
            return Ok(());
        }

        let channels = state.config.channel_count();
        for got in [inputs.len(), outputs.len()] {
            if got != channels {
                return Err(KernelError::ChannelMismatch {
                    expected: channels,
                    got,
                });
            }
        }
        let max_frames = state.config.max_block();
        if frames > max_frames {
            return Err(KernelError::BlockTooLarge { frames, max_frames });
        }
        let lengths = inputs.iter().map(|b| b.len()).chain(outputs.iter().map(|b| b.len()));
        for (index, len) in lengths.enumerate() {
            if len < frames {
                return Err(KernelError::BufferTooShort {
                    channel: index % channels,
                    len,
                    frames,
                });
            }
        }

        let mut io = Planar { inputs, outputs };
        state.process(&mut io, frames, &self.params, self.automation.as_mut(), &self.meter);
        Ok(())
    }

    /// Clear envelopes, delay lines, filters, pending automation and the meter
    ///
    /// Smoothers jump to the stored parameter values. Nothing is reallocated.
    pub fn reset(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.reset(&self.params);
        }
        if let Some(rx) = self.automation.as_mut() {
            rx.clear();
        }
        self.meter.clear();
        debug!("Kernel state reset");
    }

    /// Processing delay reported to the host, in samples
    pub fn latency_samples(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.delay.delay())
    }

    /// Whether the stored look-ahead differs from the one latched at `prepare`
    pub fn look_ahead_pending(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.look_ahead_ms != self.params.get(ParamId::LookAhead))
    }
}

impl AudioProcessor for Kernel {
    /// Process an interleaved buffer in place
    ///
    /// Buffers longer than the prepared maximum are split into blocks. An
    /// unprepared kernel, or a channel count that does not match, leaves the
    /// buffer untouched.
    fn process(&mut self, buffer: &mut [f32], context: &ProcessContext) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let channels = state.config.channel_count();
        if context.channels != channels {
            return;
        }

        let total = context.frames_in(buffer.len());
        let max_frames = state.config.max_block();
        let mut offset = 0;
        while offset < total {
            let frames = (total - offset).min(max_frames);
            let mut io = Interleaved {
                buffer: &mut *buffer,
                channels,
                offset,
            };
            state.process(&mut io, frames, &self.params, self.automation.as_mut(), &self.meter);
            offset += frames;
        }
    }

    fn reset(&mut self) {
        Kernel::reset(self);
    }

    fn name(&self) -> &'static str {
        "VX1 Compressor"
    }

    fn is_enabled(&self) -> bool {
        !self.params.get_bool(ParamId::Bypass)
    }
}
