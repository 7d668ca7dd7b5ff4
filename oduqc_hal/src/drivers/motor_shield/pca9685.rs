//! PCA9685 16-channel PWM controller as used on the stepper shield.
//!
//! Every coil output of the shield is a PWM channel: the two bridge enables
//! take a duty cycle, the four direction inputs are channels driven fully on
//! or fully off.

use super::i2c::RegisterBus;
use oduqc_common::motion::driver::DriverError;
use std::thread;
use std::time::Duration;

const MODE1: u8 = 0x00;
const PRESCALE: u8 = 0xFE;
const LED0_ON_L: u8 = 0x06;

const MODE1_SLEEP: u8 = 0x10;
const MODE1_RESTART_AI_ALLCALL: u8 = 0xA1;

/// Internal oscillator [Hz].
const OSCILLATOR_HZ: f32 = 25_000_000.0;

/// Number of PWM channels.
pub const CHANNELS: u8 = 16;

/// Counter value that switches a channel fully on.
pub const FULL_ON: u16 = 4096;

/// Prescale register value for a PWM frequency.
///
/// The requested frequency is derated by 10% to compensate for the
/// oscillator running fast.
pub fn prescale_for(frequency_hz: f32) -> u8 {
    let value = OSCILLATOR_HZ / 4096.0 / (frequency_hz * 0.9) - 1.0;
    (value + 0.5).floor().clamp(3.0, 255.0) as u8
}

/// PCA9685 on an arbitrary register bus.
#[derive(Debug)]
pub struct Pca9685<B> {
    bus: B,
}

impl<B: RegisterBus> Pca9685<B> {
    /// Wrap a bus without touching the device.
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Reset, program the PWM frequency and switch every channel off.
    pub fn begin(&mut self, frequency_hz: f32) -> Result<(), DriverError> {
        self.bus.write_register(MODE1, 0x00)?;
        self.set_frequency(frequency_hz)?;
        for channel in 0..CHANNELS {
            self.set_pwm(channel, 0, 0)?;
        }
        Ok(())
    }

    /// Program the prescaler. The oscillator must sleep while it changes.
    pub fn set_frequency(&mut self, frequency_hz: f32) -> Result<(), DriverError> {
        let prescale = prescale_for(frequency_hz);
        let old_mode = self.bus.read_register(MODE1)?;
        self.bus
            .write_register(MODE1, (old_mode & 0x7F) | MODE1_SLEEP)?;
        self.bus.write_register(PRESCALE, prescale)?;
        self.bus.write_register(MODE1, old_mode)?;
        thread::sleep(Duration::from_millis(5));
        self.bus
            .write_register(MODE1, old_mode | MODE1_RESTART_AI_ALLCALL)
    }

    /// Raw on/off counter values of one channel.
    pub fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), DriverError> {
        let [on_l, on_h] = on.to_le_bytes();
        let [off_l, off_h] = off.to_le_bytes();
        self.bus
            .write_block(LED0_ON_L + 4 * channel, &[on_l, on_h, off_l, off_h])
    }

    /// Duty cycle out of 4096; anything above 4095 is fully on.
    pub fn set_duty(&mut self, channel: u8, value: u16) -> Result<(), DriverError> {
        if value > 4095 {
            self.set_pwm(channel, FULL_ON, 0)
        } else {
            self.set_pwm(channel, 0, value)
        }
    }

    /// Drive a channel as a digital output.
    pub fn set_pin(&mut self, channel: u8, high: bool) -> Result<(), DriverError> {
        if high {
            self.set_pwm(channel, FULL_ON, 0)
        } else {
            self.set_pwm(channel, 0, 0)
        }
    }

    /// Underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }
}
