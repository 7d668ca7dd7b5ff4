//! Shared bench setup.

use oduqc_common::command::{Command, CommandLatch};
use oduqc_common::motion::config::FixtureConfig;
use oduqc_common::motion::types::AxisLabel;
use oduqc_common::signals::CancellationSource;
use oduqc_hal::drivers::simulation::{SimulatedFixture, SimulationDriver};
use oduqc_motion::{AssemblyReport, Interlock, MotionCoordinator, assemble};
use std::sync::Arc;

/// Production fixture without settle delays.
pub fn bench_config() -> FixtureConfig {
    let mut config = FixtureConfig::default();
    config.motion.settle_ms = 0;
    config
}

pub struct Bench {
    pub coordinator: MotionCoordinator,
    pub report: AssemblyReport,
    pub sim: SimulatedFixture,
    pub signals: Arc<CancellationSource>,
    pub latch: Arc<CommandLatch>,
}

impl Bench {
    pub fn with_config(config: &FixtureConfig) -> Self {
        Self::build(config, |_| {})
    }

    /// Like `with_config`, with a chance to break the simulation first.
    pub fn build(config: &FixtureConfig, prepare: impl FnOnce(&SimulatedFixture)) -> Self {
        config.validate().unwrap();
        let mut driver = SimulationDriver::new(config);
        let sim = driver.fixture();
        prepare(&sim);
        let signals = Arc::new(CancellationSource::new());
        let latch = Arc::new(CommandLatch::new());
        let interlock = Interlock::new(Arc::clone(&signals), latch.clone());
        let (coordinator, report) = assemble(config, &mut driver, interlock);
        Self {
            coordinator,
            report,
            sim,
            signals,
            latch,
        }
    }

    /// Reset home on a fresh bench, journal cleared.
    pub fn homed(config: &FixtureConfig) -> Self {
        let mut bench = Self::with_config(config);
        assert!(bench.coordinator.reset_home().is_completed());
        bench.sim.clear_journal();
        bench
    }

    pub fn production() -> Self {
        Self::homed(&bench_config())
    }

    pub fn position(&self, label: AxisLabel) -> f64 {
        self.coordinator.axis(label).unwrap().position()
    }

    pub fn all_home(&self) -> bool {
        AxisLabel::ALL
            .iter()
            .filter_map(|l| self.coordinator.axis(*l))
            .all(|a| a.is_home())
    }

    /// Post an operator stop once `label` has taken `calls` more steps.
    pub fn stop_after(&self, label: AxisLabel, calls: u64) {
        let latch = Arc::clone(&self.latch);
        self.sim
            .after_steps(label, calls, move || latch.post(Command::new('s', 0.0, "s")));
    }

    /// Raise the emergency stop once `label` has taken `calls` more steps.
    pub fn estop_after(&self, label: AxisLabel, calls: u64) {
        let signals = Arc::clone(&self.signals);
        self.sim
            .after_steps(label, calls, move || signals.trigger_emergency_stop());
    }
}
