//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `FixtureDriver` trait on top of
//! the shared [`World`]. Boards, motors and limit switches handed out by the
//! driver keep the world alive after the driver itself is dropped.

use super::world::{PortKey, SimulatedFixture, World};
use oduqc_common::motion::config::{AxisConfig, BoardConfig, FixtureConfig};
use oduqc_common::motion::driver::{
    DriverError, FixtureDriver, LimitSwitch, MotorHandle, StepperBoard,
};
use oduqc_common::motion::types::{AxisLabel, Direction, StepStyle};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Simulation driver implementing the `FixtureDriver` trait.
pub struct SimulationDriver {
    name: &'static str,
    version: &'static str,
    world: Arc<Mutex<World>>,
}

impl SimulationDriver {
    /// Create a simulation of the fixture described by `config`.
    ///
    /// Every configured axis gets a carriage parked a short way off its
    /// limit switch.
    pub fn new(config: &FixtureConfig) -> Self {
        info!(axes = config.axes.len(), "Simulation driver created");
        Self {
            name: super::DRIVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
            world: Arc::new(Mutex::new(World::new(config))),
        }
    }

    /// Handle for inspecting and steering the simulation.
    pub fn fixture(&self) -> SimulatedFixture {
        SimulatedFixture::new(Arc::clone(&self.world))
    }
}

impl FixtureDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn open_board(&mut self, config: &BoardConfig) -> Result<Box<dyn StepperBoard>, DriverError> {
        Ok(Box::new(SimBoard {
            name: config.name.clone(),
            started: false,
            world: Arc::clone(&self.world),
        }))
    }

    fn open_limit_switch(&mut self, axis: &AxisConfig) -> Result<Box<dyn LimitSwitch>, DriverError> {
        Ok(Box::new(SimLimitSwitch {
            label: axis.label,
            world: Arc::clone(&self.world),
        }))
    }
}

struct SimBoard {
    name: String,
    started: bool,
    world: Arc<Mutex<World>>,
}

impl StepperBoard for SimBoard {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn ensure_started(&mut self) -> Result<(), DriverError> {
        if !self.started {
            self.world.lock().record_start(&self.name);
            self.started = true;
            debug!(board = %self.name, "Simulated board started");
        }
        Ok(())
    }

    fn acquire_motor(
        &mut self,
        port: u8,
        steps_per_revolution: u16,
        rpm: u16,
    ) -> Result<Box<dyn MotorHandle>, DriverError> {
        self.ensure_started()?;
        let key = self
            .world
            .lock()
            .acquire(&self.name, port, steps_per_revolution, rpm)?;
        Ok(Box::new(SimMotor {
            key,
            world: Arc::clone(&self.world),
        }))
    }
}

struct SimMotor {
    key: PortKey,
    world: Arc<Mutex<World>>,
}

impl MotorHandle for SimMotor {
    fn step(
        &mut self,
        count: u32,
        direction: Direction,
        style: StepStyle,
    ) -> Result<(), DriverError> {
        let (result, due) = self.world.lock().step(&self.key, count, direction, style);
        // Injected actions may reach back into the world.
        for action in due {
            action();
        }
        result
    }

    fn release(&mut self) -> Result<(), DriverError> {
        self.world.lock().release(&self.key);
        Ok(())
    }
}

struct SimLimitSwitch {
    label: AxisLabel,
    world: Arc<Mutex<World>>,
}

impl LimitSwitch for SimLimitSwitch {
    fn is_active(&mut self) -> Result<bool, DriverError> {
        Ok(self.world.lock().limit_active(self.label))
    }
}
