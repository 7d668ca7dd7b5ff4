//! Stepper shield driver.
//!
//! Each board is a two-port stepper shield whose coil outputs are PWM
//! channels of a PCA9685 on the I2C bus. Limit switches are GPIO inputs read
//! through sysfs.
//!
//! - [`i2c`] - `/dev/i2c-N` register access
//! - [`pca9685`] - PWM controller
//! - [`stepper`] - Coil sequencing and step timing
//! - [`gpio`] - Limit switch inputs

pub mod gpio;
pub mod i2c;
pub mod pca9685;
pub mod stepper;

use gpio::SysfsLimitSwitch;
use i2c::{I2cDevice, RegisterBus};
use oduqc_common::motion::config::{AxisConfig, BoardConfig, FixtureConfig};
use oduqc_common::motion::driver::{
    DriverError, FixtureDriver, LimitSwitch, MotorHandle, StepperBoard,
};
use oduqc_common::motion::types::{Direction, StepStyle};
use parking_lot::Mutex;
use pca9685::Pca9685;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use stepper::{CoilSequencer, SHIELD_MICROSTEPS, StepperPins, step_interval, style_interval};
use tracing::{debug, info};

/// Registry name of the stepper shield driver.
pub const DRIVER_NAME: &str = "motor_shield";

/// Factory function to create a stepper shield driver instance.
pub fn create_driver(config: &FixtureConfig) -> Result<Box<dyn FixtureDriver>, DriverError> {
    Ok(Box::new(MotorShieldDriver::new(config)?))
}

/// Stepper shield driver implementing the `FixtureDriver` trait.
#[derive(Debug)]
pub struct MotorShieldDriver {
    gpio_root: PathBuf,
}

impl MotorShieldDriver {
    /// Check the configuration against what the shield can do.
    pub fn new(config: &FixtureConfig) -> Result<Self, DriverError> {
        if config.motion.microsteps_per_step != u32::from(SHIELD_MICROSTEPS) {
            return Err(DriverError::InitFailed(format!(
                "stepper shield microsteps at {SHIELD_MICROSTEPS} per step, configured {}",
                config.motion.microsteps_per_step
            )));
        }
        Ok(Self {
            gpio_root: config.gpio_root.clone(),
        })
    }
}

impl FixtureDriver for MotorShieldDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn open_board(&mut self, config: &BoardConfig) -> Result<Box<dyn StepperBoard>, DriverError> {
        Ok(Box::new(ShieldBoard {
            config: config.clone(),
            controller: Arc::new(Mutex::new(None)),
            acquired: HashSet::new(),
        }))
    }

    fn open_limit_switch(&mut self, axis: &AxisConfig) -> Result<Box<dyn LimitSwitch>, DriverError> {
        Ok(Box::new(SysfsLimitSwitch::open(
            &self.gpio_root,
            axis.limit_pin,
        )?))
    }
}

type SharedController<B> = Arc<Mutex<Option<Pca9685<B>>>>;

struct ShieldBoard {
    config: BoardConfig,
    controller: SharedController<I2cDevice>,
    acquired: HashSet<u8>,
}

impl StepperBoard for ShieldBoard {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn is_started(&self) -> bool {
        self.controller.lock().is_some()
    }

    fn ensure_started(&mut self) -> Result<(), DriverError> {
        let mut controller = self.controller.lock();
        if controller.is_some() {
            return Ok(());
        }
        let device = I2cDevice::open(&self.config.bus, self.config.address)
            .map_err(|e| DriverError::InitFailed(format!("board '{}': {e}", self.config.name)))?;
        let mut pwm = Pca9685::new(device);
        pwm.begin(self.config.pwm_frequency)?;
        info!(
            board = %self.config.name,
            address = %format!("0x{:02X}", self.config.address),
            "Stepper shield started"
        );
        *controller = Some(pwm);
        Ok(())
    }

    fn acquire_motor(
        &mut self,
        port: u8,
        steps_per_revolution: u16,
        rpm: u16,
    ) -> Result<Box<dyn MotorHandle>, DriverError> {
        self.ensure_started()?;
        let pins = StepperPins::for_port(port).ok_or_else(|| DriverError::NoSuchMotor {
            board: self.config.name.clone(),
            port,
        })?;
        if !self.acquired.insert(port) {
            return Err(DriverError::PortInUse {
                board: self.config.name.clone(),
                port,
            });
        }
        debug!(board = %self.config.name, port, steps_per_revolution, rpm, "Motor acquired");
        Ok(Box::new(ShieldMotor::new(
            Arc::clone(&self.controller),
            pins,
            step_interval(steps_per_revolution, rpm),
        )))
    }
}

/// One stepper port; shares the board's controller with its sibling port.
struct ShieldMotor<B> {
    controller: SharedController<B>,
    pins: StepperPins,
    sequencer: CoilSequencer,
    full_step: Duration,
}

impl<B: RegisterBus> ShieldMotor<B> {
    fn new(controller: SharedController<B>, pins: StepperPins, full_step: Duration) -> Self {
        Self {
            controller,
            pins,
            sequencer: CoilSequencer::default(),
            full_step,
        }
    }

    fn with_controller<T>(
        &self,
        f: impl FnOnce(&mut Pca9685<B>) -> Result<T, DriverError>,
    ) -> Result<T, DriverError> {
        let mut guard = self.controller.lock();
        let pwm = guard
            .as_mut()
            .ok_or_else(|| DriverError::InitFailed("board not started".to_string()))?;
        f(pwm)
    }
}

impl<B: RegisterBus> MotorHandle for ShieldMotor<B> {
    fn step(
        &mut self,
        count: u32,
        direction: Direction,
        style: StepStyle,
    ) -> Result<(), DriverError> {
        let interval = style_interval(self.full_step, style);
        let pins = self.pins;
        for _ in 0..count {
            let output = self.sequencer.advance(direction, style);
            self.with_controller(|pwm| {
                pwm.set_duty(pins.pwm_a, output.duty_a)?;
                pwm.set_duty(pins.pwm_b, output.duty_b)?;
                for (bit, channel) in pins.coils().into_iter().enumerate() {
                    pwm.set_pin(channel, output.latch & (1 << bit) != 0)?;
                }
                Ok(())
            })?;
            thread::sleep(interval);
        }
        Ok(())
    }

    fn release(&mut self) -> Result<(), DriverError> {
        let pins = self.pins;
        self.with_controller(|pwm| {
            for channel in pins.coils() {
                pwm.set_pin(channel, false)?;
            }
            pwm.set_duty(pins.pwm_a, 0)?;
            pwm.set_duty(pins.pwm_b, 0)
        })
    }
}
