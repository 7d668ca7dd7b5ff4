//! Shared simulation state.
//!
//! One `World` per simulation driver, shared by its boards, motors and
//! limit switches through an `Arc<Mutex<_>>`. Carriage positions are kept
//! in microsteps; a carriage sits on its limit switch while its position is
//! at or behind zero and stalls against a hard stop a little further back.

use oduqc_common::motion::config::FixtureConfig;
use oduqc_common::motion::driver::DriverError;
use oduqc_common::motion::types::{AxisLabel, Direction, StepStyle};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::trace;

/// Distance behind the switch at which the carriage stalls [full steps].
const HARD_STOP_STEPS: i64 = 2;

/// Where a carriage starts when the test does not say otherwise [full steps].
pub(crate) const DEFAULT_START_STEPS: f64 = 100.0;

/// (board name, port)
pub(crate) type PortKey = (String, u8);

type Action = Box<dyn FnOnce() + Send>;

/// One recorded motor call.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalEvent {
    /// `MotorHandle::step`.
    Step {
        /// Steps or microsteps, per `style`.
        count: u32,
        /// Commanded direction.
        direction: Direction,
        /// Coil drive style.
        style: StepStyle,
    },
    /// `MotorHandle::release`.
    Release,
}

/// One journal line.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    /// Board the motor sits on.
    pub board: String,
    /// Port on that board.
    pub port: u8,
    /// Axis wired to this port, if any.
    pub axis: Option<AxisLabel>,
    /// What happened.
    pub event: JournalEvent,
}

#[derive(Debug)]
struct Carriage {
    axis: Option<AxisLabel>,
    position: i64,
    energised: bool,
    step_calls: u64,
    acquired: Option<(u16, u16)>,
}

impl Carriage {
    fn new(axis: Option<AxisLabel>, position: i64) -> Self {
        Self {
            axis,
            position,
            energised: false,
            step_calls: 0,
            acquired: None,
        }
    }
}

struct Trigger {
    key: PortKey,
    at_call: u64,
    action: Action,
}

struct Fault {
    key: PortKey,
    at_call: u64,
}

pub(crate) struct World {
    microsteps_per_step: i64,
    carriages: HashMap<PortKey, Carriage>,
    bindings: HashMap<AxisLabel, PortKey>,
    missing: HashSet<PortKey>,
    starts: HashMap<String, u32>,
    forced_limits: HashMap<AxisLabel, bool>,
    journal: Vec<JournalEntry>,
    triggers: Vec<Trigger>,
    faults: Vec<Fault>,
}

impl World {
    pub(crate) fn new(config: &FixtureConfig) -> Self {
        let microsteps_per_step = i64::from(config.motion.microsteps_per_step.max(1));
        let start = (DEFAULT_START_STEPS * microsteps_per_step as f64) as i64;
        let mut carriages = HashMap::new();
        let mut bindings = HashMap::new();
        for axis in &config.axes {
            let key = (axis.board.clone(), axis.port);
            carriages.insert(key.clone(), Carriage::new(Some(axis.label), start));
            bindings.insert(axis.label, key);
        }
        Self {
            microsteps_per_step,
            carriages,
            bindings,
            missing: HashSet::new(),
            starts: HashMap::new(),
            forced_limits: HashMap::new(),
            journal: Vec::new(),
            triggers: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub(crate) fn record_start(&mut self, board: &str) {
        *self.starts.entry(board.to_string()).or_default() += 1;
    }

    pub(crate) fn acquire(
        &mut self,
        board: &str,
        port: u8,
        steps_per_revolution: u16,
        rpm: u16,
    ) -> Result<PortKey, DriverError> {
        let key = (board.to_string(), port);
        if self.missing.contains(&key) {
            return Err(DriverError::NoSuchMotor {
                board: board.to_string(),
                port,
            });
        }
        let carriage = self
            .carriages
            .entry(key.clone())
            .or_insert_with(|| Carriage::new(None, 0));
        if carriage.acquired.is_some() {
            return Err(DriverError::PortInUse {
                board: board.to_string(),
                port,
            });
        }
        carriage.acquired = Some((steps_per_revolution, rpm));
        Ok(key)
    }

    /// Apply one step call. Returns the actions that became due.
    pub(crate) fn step(
        &mut self,
        key: &PortKey,
        count: u32,
        direction: Direction,
        style: StepStyle,
    ) -> (Result<(), DriverError>, Vec<Action>) {
        let mps = self.microsteps_per_step;
        let Some(carriage) = self.carriages.get_mut(key) else {
            return (
                Err(DriverError::NoSuchMotor {
                    board: key.0.clone(),
                    port: key.1,
                }),
                Vec::new(),
            );
        };
        carriage.step_calls += 1;
        let call = carriage.step_calls;

        if let Some(i) = self
            .faults
            .iter()
            .position(|f| &f.key == key && f.at_call == call)
        {
            self.faults.swap_remove(i);
            return (
                Err(DriverError::Bus(format!(
                    "simulated bus fault on '{}' port {}",
                    key.0, key.1
                ))),
                Vec::new(),
            );
        }

        let per_count = match style {
            StepStyle::Single | StepStyle::Double => mps,
            StepStyle::Interleave => (mps / 2).max(1),
            StepStyle::Microstep => 1,
        };
        let sign = match direction {
            Direction::Forward => 1,
            Direction::Backward => -1,
            Direction::Unset => 0,
        };
        let floor = -HARD_STOP_STEPS * mps;
        carriage.position = (carriage.position + sign * per_count * i64::from(count)).max(floor);
        carriage.energised = true;
        trace!(board = %key.0, port = key.1, position = carriage.position, "sim step");

        self.journal.push(JournalEntry {
            board: key.0.clone(),
            port: key.1,
            axis: carriage.axis,
            event: JournalEvent::Step {
                count,
                direction,
                style,
            },
        });

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.triggers.len() {
            if &self.triggers[i].key == key && self.triggers[i].at_call == call {
                due.push(self.triggers.swap_remove(i).action);
            } else {
                i += 1;
            }
        }
        (Ok(()), due)
    }

    pub(crate) fn release(&mut self, key: &PortKey) {
        if let Some(carriage) = self.carriages.get_mut(key) {
            carriage.energised = false;
            self.journal.push(JournalEntry {
                board: key.0.clone(),
                port: key.1,
                axis: carriage.axis,
                event: JournalEvent::Release,
            });
        }
    }

    pub(crate) fn limit_active(&self, label: AxisLabel) -> bool {
        if let Some(forced) = self.forced_limits.get(&label) {
            return *forced;
        }
        self.bindings
            .get(&label)
            .and_then(|key| self.carriages.get(key))
            .is_some_and(|c| c.position <= 0)
    }

    fn key_of(&self, label: AxisLabel) -> Option<&PortKey> {
        self.bindings.get(&label)
    }
}

/// Handle onto a running simulation, cloned out of the driver.
#[derive(Clone)]
pub struct SimulatedFixture {
    world: Arc<Mutex<World>>,
}

impl SimulatedFixture {
    pub(crate) fn new(world: Arc<Mutex<World>>) -> Self {
        Self { world }
    }

    /// Every motor call so far, in order.
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.world.lock().journal.clone()
    }

    /// Forget the journal recorded so far.
    pub fn clear_journal(&self) {
        self.world.lock().journal.clear();
    }

    /// Axes in the order they moved, consecutive calls on one axis collapsed.
    pub fn motion_order(&self) -> Vec<AxisLabel> {
        let world = self.world.lock();
        let mut order: Vec<AxisLabel> = Vec::new();
        for entry in &world.journal {
            if let (JournalEvent::Step { .. }, Some(axis)) = (&entry.event, entry.axis) {
                if order.last() != Some(&axis) {
                    order.push(axis);
                }
            }
        }
        order
    }

    /// Carriage position of an axis [full steps].
    pub fn physical_position(&self, label: AxisLabel) -> Option<f64> {
        let world = self.world.lock();
        let mps = world.microsteps_per_step as f64;
        world
            .key_of(label)
            .and_then(|key| world.carriages.get(key))
            .map(|c| c.position as f64 / mps)
    }

    /// Teleport a carriage [full steps].
    pub fn set_physical_position(&self, label: AxisLabel, steps: f64) {
        let mut world = self.world.lock();
        let mps = world.microsteps_per_step as f64;
        if let Some(key) = world.key_of(label).cloned() {
            if let Some(c) = world.carriages.get_mut(&key) {
                c.position = (steps * mps).round() as i64;
            }
        }
    }

    /// Whether the axis motor currently holds torque.
    pub fn is_energised(&self, label: AxisLabel) -> bool {
        let world = self.world.lock();
        world
            .key_of(label)
            .and_then(|key| world.carriages.get(key))
            .is_some_and(|c| c.energised)
    }

    /// Number of `step` calls the axis motor has received.
    pub fn step_calls(&self, label: AxisLabel) -> u64 {
        let world = self.world.lock();
        world
            .key_of(label)
            .and_then(|key| world.carriages.get(key))
            .map_or(0, |c| c.step_calls)
    }

    /// Number of times a board ran its bus initialization.
    pub fn board_starts(&self, board: &str) -> u32 {
        self.world.lock().starts.get(board).copied().unwrap_or(0)
    }

    /// Unplug the motor on a port; later acquisitions fail with `NoSuchMotor`.
    pub fn detach_motor(&self, board: &str, port: u8) {
        self.world.lock().missing.insert((board.to_string(), port));
    }

    /// Override an axis limit switch reading, or return it to physics with `None`.
    pub fn force_limit(&self, label: AxisLabel, state: Option<bool>) {
        let mut world = self.world.lock();
        match state {
            Some(active) => world.forced_limits.insert(label, active),
            None => world.forced_limits.remove(&label),
        };
    }

    /// Current limit switch reading of an axis.
    pub fn limit_active(&self, label: AxisLabel) -> bool {
        self.world.lock().limit_active(label)
    }

    /// Run `action` right after the `calls`-th step call from now on `label`.
    pub fn after_steps(&self, label: AxisLabel, calls: u64, action: impl FnOnce() + Send + 'static) {
        let mut world = self.world.lock();
        let Some(key) = world.key_of(label).cloned() else {
            return;
        };
        let done = world.carriages.get(&key).map_or(0, |c| c.step_calls);
        world.triggers.push(Trigger {
            key,
            at_call: done + calls,
            action: Box::new(action),
        });
    }

    /// Make the `calls`-th step call from now on `label` fail with a bus error.
    pub fn fail_step(&self, label: AxisLabel, calls: u64) {
        let mut world = self.world.lock();
        let Some(key) = world.key_of(label).cloned() else {
            return;
        };
        let done = world.carriages.get(&key).map_or(0, |c| c.step_calls);
        world.faults.push(Fault {
            key,
            at_call: done + calls,
        });
    }
}

impl std::fmt::Debug for SimulatedFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let world = self.world.lock();
        f.debug_struct("SimulatedFixture")
            .field("carriages", &world.carriages.len())
            .field("journal", &world.journal.len())
            .finish()
    }
}
