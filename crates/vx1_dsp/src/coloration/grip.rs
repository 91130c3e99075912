//! Grip: pre-gain warm tube
//!
//! Asymmetric tube transfer curve driven harder as the control rises. The
//! positive half bends earlier and harder than the negative half, which adds
//! even harmonics, so a first-order DC blocker at 5 Hz follows the shaper.

use std::f32::consts::TAU;

use super::ColorationStage;

/// Cutoff of the DC blocker
pub const DC_BLOCKER_HZ: f32 = 5.0;

const MAX_EXTRA_DRIVE: f32 = 4.0;
const POSITIVE_KNEE: f32 = 0.4;
const NEGATIVE_KNEE: f32 = 0.6;
const CUBIC_AMOUNT: f32 = 0.15;

/// First-order high-pass: `y = x - x1 + r * y1`
#[derive(Debug, Clone)]
pub struct DcBlocker {
    r: f32,
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            r: (1.0 - TAU * DC_BLOCKER_HZ / sample_rate).clamp(0.0, 0.9999),
            x1: 0.0,
            y1: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x1 + self.r * self.y1;
        self.x1 = input;
        self.y1 = output;
        output
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

/// Warm-tube transfer curve, continuous at both knees and bounded to
/// roughly [-1.09, 0.81]
#[inline]
pub fn tube_curve(x: f32) -> f32 {
    let cubic = |v: f32| v + v * v * v * CUBIC_AMOUNT;
    if x > POSITIVE_KNEE {
        cubic(POSITIVE_KNEE) + ((x - POSITIVE_KNEE) * 2.5).tanh() * 0.4
    } else if x < -NEGATIVE_KNEE {
        cubic(-NEGATIVE_KNEE) + ((x + NEGATIVE_KNEE) * 2.0).tanh() * 0.45
    } else {
        cubic(x)
    }
}

/// Grip stage for one channel
#[derive(Debug, Clone)]
pub struct Grip {
    dc_blocker: DcBlocker,
}

impl Grip {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            dc_blocker: DcBlocker::new(sample_rate),
        }
    }
}

impl ColorationStage for Grip {
    #[inline]
    fn process(&mut self, input: f32, amount: f32) -> f32 {
        let amount = amount.clamp(0.0, 1.0);
        let drive = 1.0 + MAX_EXTRA_DRIVE * amount;
        let shaped = self.dc_blocker.process(tube_curve(input * drive)) / drive;
        if amount <= 0.0 {
            return input;
        }
        input * (1.0 - amount) + shaped * amount
    }

    fn reset(&mut self) {
        self.dc_blocker.reset();
    }

    fn name(&self) -> &'static str {
        "Grip"
    }
}
