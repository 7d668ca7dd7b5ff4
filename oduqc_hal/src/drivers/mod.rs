//! Fixture driver implementations.
//!
//! - [`motor_shield`] - Two-port I2C stepper shields with sysfs GPIO limit switches
//! - [`simulation`] - Physics-backed test double with a motor call journal
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `FixtureDriver` trait from `oduqc_common::motion::driver`
//! 3. Register the driver in [`register_all_drivers`]

pub mod motor_shield;
pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register(simulation::DRIVER_NAME, simulation::create_driver);
    registry.register(motor_shield::DRIVER_NAME, motor_shield::create_driver);
}
