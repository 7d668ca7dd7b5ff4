//! Bipolar stepper coil sequencing on the shield's dual H-bridge.
//!
//! The sequencer tracks the electrical phase in microsteps (four full steps
//! per electrical cycle) and produces, for every step, the two bridge
//! duty cycles and the four coil direction bits.

use oduqc_common::motion::types::{Direction, StepStyle};
use std::time::Duration;

/// Microsteps per full step produced by the shield.
pub const SHIELD_MICROSTEPS: u16 = 16;

const CYCLE: u16 = SHIELD_MICROSTEPS * 4;
const HALF: u16 = SHIELD_MICROSTEPS / 2;

/// Bridge current profile over one quarter cycle.
pub const MICROSTEP_CURVE: [u8; SHIELD_MICROSTEPS as usize + 1] = [
    0, 25, 50, 74, 98, 120, 141, 162, 180, 197, 212, 225, 236, 244, 250, 253, 255,
];

/// Coil bits per half step of the full/half-step sequence.
const HALF_STEP_LATCH: [u8; 8] = [0x1, 0x3, 0x2, 0x6, 0x4, 0xC, 0x8, 0x9];

/// PWM channels wired to one stepper port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepperPins {
    /// Bridge A enable.
    pub pwm_a: u8,
    /// Bridge A input 2.
    pub ain2: u8,
    /// Bridge A input 1.
    pub ain1: u8,
    /// Bridge B enable.
    pub pwm_b: u8,
    /// Bridge B input 2.
    pub bin2: u8,
    /// Bridge B input 1.
    pub bin1: u8,
}

impl StepperPins {
    /// Channel map of a shield port; `None` for ports the shield lacks.
    pub const fn for_port(port: u8) -> Option<Self> {
        match port {
            1 => Some(Self {
                pwm_a: 8,
                ain2: 9,
                ain1: 10,
                pwm_b: 13,
                bin2: 12,
                bin1: 11,
            }),
            2 => Some(Self {
                pwm_a: 2,
                ain2: 3,
                ain1: 4,
                pwm_b: 7,
                bin2: 6,
                bin1: 5,
            }),
            _ => None,
        }
    }

    /// The four coil direction channels, in latch bit order.
    pub const fn coils(&self) -> [u8; 4] {
        [self.ain2, self.bin1, self.ain1, self.bin2]
    }
}

/// Output of one sequencer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoilOutput {
    /// Bridge A duty cycle out of 4096.
    pub duty_a: u16,
    /// Bridge B duty cycle out of 4096.
    pub duty_b: u16,
    /// Coil bits: 0x1 AIN2, 0x2 BIN1, 0x4 AIN1, 0x8 BIN2.
    pub latch: u8,
}

/// Electrical phase tracker.
#[derive(Debug, Clone, Default)]
pub struct CoilSequencer {
    phase: u16,
}

impl CoilSequencer {
    /// Current phase in microsteps, `0..64`.
    #[inline]
    pub fn phase(&self) -> u16 {
        self.phase
    }

    fn advance_by(&mut self, delta: u16, direction: Direction) {
        self.phase = match direction {
            Direction::Forward => (self.phase + delta) % CYCLE,
            Direction::Backward => (self.phase + CYCLE - delta % CYCLE) % CYCLE,
            Direction::Unset => self.phase,
        };
    }

    /// Advance one step of `style` and return the coil drive for the new phase.
    pub fn advance(&mut self, direction: Direction, style: StepStyle) -> CoilOutput {
        let odd_half = (self.phase / HALF) % 2 == 1;
        match style {
            // Single lands on even half steps, double on odd ones.
            StepStyle::Single if odd_half => self.advance_by(HALF, direction),
            StepStyle::Single => self.advance_by(SHIELD_MICROSTEPS, direction),
            StepStyle::Double if !odd_half => self.advance_by(HALF, direction),
            StepStyle::Double => self.advance_by(SHIELD_MICROSTEPS, direction),
            StepStyle::Interleave => self.advance_by(HALF, direction),
            StepStyle::Microstep => self.advance_by(1, direction),
        }

        if style == StepStyle::Microstep {
            let (a, b, latch) = microstep_drive(self.phase);
            CoilOutput {
                duty_a: u16::from(a) * 16,
                duty_b: u16::from(b) * 16,
                latch,
            }
        } else {
            CoilOutput {
                duty_a: 255 * 16,
                duty_b: 255 * 16,
                latch: HALF_STEP_LATCH[usize::from(self.phase / HALF)],
            }
        }
    }
}

fn microstep_drive(phase: u16) -> (u8, u8, u8) {
    let m = SHIELD_MICROSTEPS;
    let curve = |i: u16| MICROSTEP_CURVE[usize::from(i)];
    match phase / m {
        0 => (curve(m - phase), curve(phase), 0x03),
        1 => (curve(phase - m), curve(2 * m - phase), 0x06),
        2 => (curve(3 * m - phase), curve(phase - 2 * m), 0x0C),
        _ => (curve(phase - 3 * m), curve(4 * m - phase), 0x09),
    }
}

/// Delay per full step at `rpm`.
pub fn step_interval(steps_per_revolution: u16, rpm: u16) -> Duration {
    let per_minute = u64::from(steps_per_revolution) * u64::from(rpm.max(1));
    Duration::from_micros(60_000_000 / per_minute.max(1))
}

/// Delay per call unit of `style`.
pub fn style_interval(full_step: Duration, style: StepStyle) -> Duration {
    match style {
        StepStyle::Single | StepStyle::Double => full_step,
        StepStyle::Interleave => full_step / 2,
        StepStyle::Microstep => full_step / u32::from(SHIELD_MICROSTEPS),
    }
}
