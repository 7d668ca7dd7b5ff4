//! Driver capability traits and error types.
//!
//! This module defines:
//! - `FixtureDriver` trait - Pluggable backend that opens boards and limit inputs
//! - `StepperBoard` trait - One driver board, lazily started, hands out motors by port
//! - `MotorHandle` trait - One stepper motor owned by one axis
//! - `LimitSwitch` trait - One zero-reference sensor
//! - `DriverError` enum - Error types for driver operations
//! - `DriverFactory` type alias - Factory function type
//!
//! The motion core depends on these traits only. Concrete backends live in
//! the `oduqc_hal` crate (stepper shield hardware and a simulation).

use crate::motion::config::{AxisConfig, BoardConfig, FixtureConfig};
use crate::motion::types::{Direction, StepStyle};
use thiserror::Error;

/// Error types for driver operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    /// Board or driver initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// The requested port has no motor attached.
    #[error("No motor on port {port} of board '{board}'")]
    NoSuchMotor { board: String, port: u8 },

    /// The port is already owned by another axis.
    #[error("Port {port} of board '{board}' is already in use")]
    PortInUse { board: String, port: u8 },

    /// Bus communication error.
    #[error("Bus error: {0}")]
    Bus(String),

    /// GPIO access error.
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// No factory registered under this name.
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// An axis references a board the configuration does not declare.
    #[error("Board not found: {0}")]
    BoardNotFound(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn(&FixtureConfig) -> Result<Box<dyn FixtureDriver>, DriverError>;

/// One stepper motor, exclusively owned by the axis that acquired it.
pub trait MotorHandle: Send {
    /// Actuate `count` steps (microsteps for `StepStyle::Microstep`) and
    /// block until they are physically complete.
    fn step(&mut self, count: u32, direction: Direction, style: StepStyle)
    -> Result<(), DriverError>;

    /// De-energise the windings. Safe to call at any time.
    fn release(&mut self) -> Result<(), DriverError>;
}

/// One zero-reference limit sensor.
pub trait LimitSwitch: Send {
    /// `Ok(true)` while the sensor is actuated.
    fn is_active(&mut self) -> Result<bool, DriverError>;
}

/// One physical driver board carrying up to `PORTS_PER_BOARD` steppers.
pub trait StepperBoard: Send {
    /// Configured board name.
    fn name(&self) -> &str;

    /// Whether bus initialization has already run.
    fn is_started(&self) -> bool;

    /// Initialize the bus at most once; later calls are no-ops.
    fn ensure_started(&mut self) -> Result<(), DriverError>;

    /// Acquire the motor on `port`, configured for `rpm`.
    ///
    /// Starts the board if needed. Fails with `DriverError::NoSuchMotor`
    /// if the port has no motor and with `DriverError::PortInUse` if it was
    /// handed out before.
    fn acquire_motor(
        &mut self,
        port: u8,
        steps_per_revolution: u16,
        rpm: u16,
    ) -> Result<Box<dyn MotorHandle>, DriverError>;
}

/// Pluggable fixture backend.
///
/// # Lifecycle
///
/// 1. Created by a `DriverFactory` from the fixture configuration
/// 2. `open_board()` once per configured board
/// 3. `open_limit_switch()` once per configured axis
///
/// Handles returned by the driver stay valid after the driver is dropped.
pub trait FixtureDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation", "motor_shield").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Open one board. Bus initialization is deferred to `ensure_started()`.
    fn open_board(&mut self, config: &BoardConfig) -> Result<Box<dyn StepperBoard>, DriverError>;

    /// Open the limit sensor of one axis.
    fn open_limit_switch(&mut self, axis: &AxisConfig) -> Result<Box<dyn LimitSwitch>, DriverError>;
}
