//! Simulation driver module.
//!
//! Software fixture for development and testing without hardware. Every
//! motor moves a simulated carriage; every limit switch reads the carriage
//! it is wired to. Tests reach into the running simulation through a
//! [`SimulatedFixture`] handle to inspect the motor call journal, force
//! sensor states, and inject stops or faults after a given number of steps.

mod driver;
mod world;

pub use driver::SimulationDriver;
pub use world::{JournalEntry, JournalEvent, SimulatedFixture};

use oduqc_common::motion::config::FixtureConfig;
use oduqc_common::motion::driver::{DriverError, FixtureDriver};

/// Registry name of the simulation driver.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulation driver instance.
pub fn create_driver(config: &FixtureConfig) -> Result<Box<dyn FixtureDriver>, DriverError> {
    Ok(Box::new(SimulationDriver::new(config)))
}
