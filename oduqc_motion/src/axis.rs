//! Single stepper axis: bounded, cancellable, backlash-compensated stepping
//! and limit-switch homing.
//!
//! ## Position tracking
//!
//! `position` is the distance from the limit switch in full steps. Moves are
//! quantised to microsteps (`microsteps_per_step`, a power of two), so the
//! tracked value is exact. It is advanced by exactly what was actuated, also
//! when a move is cut short, and only reset to zero by the limit switch.
//!
//! ## Move anatomy (forward, non-exempt axis)
//!
//! ```text
//!   clear switch ─► whole steps + overshoot ─► retract overshoot ─► microsteps
//!        │                 │ poll                  │ poll               │ poll
//!        ▼                 ▼                       ▼                    ▼
//!   (zero on release)  stop on limit / operator / emergency / fatal / fault
//! ```

use oduqc_common::motion::config::{AxisConfig, MotionSettings};
use oduqc_common::motion::driver::{DriverError, LimitSwitch, MotorHandle};
use oduqc_common::motion::types::{AxisLabel, Direction, StepStyle};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, trace, warn};

use crate::interlock::{Interlock, LoopOutcome, StopCause, run_increments};

// ─── Axis State ─────────────────────────────────────────────────────

/// Per-call axis state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AxisState {
    /// No reference since start.
    #[default]
    Unhomed,
    /// Zeroed on the limit switch by the last call.
    Homed,
    /// A stepping call is in progress.
    Moving,
    /// The last call ended away from home.
    Stopped,
}

/// Result of a relative move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Signed distance actually travelled [steps].
    pub travelled: f64,
    /// Why the move ended early.
    pub stop: Option<StopCause>,
}

impl MoveOutcome {
    const IDLE: Self = Self {
        travelled: 0.0,
        stop: None,
    };

    #[inline]
    pub const fn is_complete(&self) -> bool {
        self.stop.is_none()
    }

    /// Stop cause that must end an enclosing sequence.
    #[inline]
    pub fn abort_cause(&self) -> Option<StopCause> {
        self.stop.filter(StopCause::aborts_sequence)
    }
}

/// Result of a homing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HomingOutcome {
    /// Backed onto the switch, cleared it, zeroed.
    Homed,
    /// The switch was already active; nothing was done.
    AlreadyOnSensor,
    /// Full travel completed without meeting the switch.
    SwitchNotFound,
    /// Stopped by something other than the switch.
    Interrupted(StopCause),
}

impl HomingOutcome {
    pub fn interruption(&self) -> Option<StopCause> {
        match self {
            Self::Interrupted(cause) => Some(*cause),
            _ => None,
        }
    }
}

// ─── Parameters ─────────────────────────────────────────────────────

/// Static stepping parameters of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisParams {
    /// Software travel limit [steps].
    pub limit: u32,
    /// Forward over-travel, 0 for exempt axes [steps].
    pub overshoot: u32,
    /// Steps per polled increment.
    pub step_size: u32,
    /// Microsteps per full step.
    pub microsteps_per_step: u32,
    /// Bound on microsteps taken while backing off the switch.
    pub max_clear_microsteps: u32,
}

impl AxisParams {
    pub fn from_config(axis: &AxisConfig, motion: &MotionSettings) -> Self {
        Self {
            limit: axis.limit,
            overshoot: motion.overshoot_for(axis.label) as u32,
            step_size: motion.step_size.max(1),
            microsteps_per_step: motion.microsteps_per_step.max(1),
            max_clear_microsteps: motion.max_clear_microsteps,
        }
    }
}

// ─── Axis ───────────────────────────────────────────────────────────

/// One controlled degree of freedom.
pub struct Axis {
    label: AxisLabel,
    motor: Box<dyn MotorHandle>,
    limit_switch: Box<dyn LimitSwitch>,
    params: AxisParams,
    position: f64,
    direction: Direction,
    at_home: bool,
    state: AxisState,
}

impl Axis {
    pub fn new(
        label: AxisLabel,
        motor: Box<dyn MotorHandle>,
        limit_switch: Box<dyn LimitSwitch>,
        params: AxisParams,
    ) -> Self {
        Self {
            label,
            motor,
            limit_switch,
            params,
            position: 0.0,
            direction: Direction::Unset,
            at_home: false,
            state: AxisState::Unhomed,
        }
    }

    #[inline]
    pub fn label(&self) -> AxisLabel {
        self.label
    }

    /// Tracked distance from the limit switch [steps].
    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub fn is_home(&self) -> bool {
        self.at_home
    }

    #[inline]
    pub fn state(&self) -> AxisState {
        self.state
    }

    #[inline]
    pub fn limit(&self) -> u32 {
        self.params.limit
    }

    #[inline]
    pub fn params(&self) -> &AxisParams {
        &self.params
    }

    /// Limit sensor reading. A sensor that cannot be read counts as active.
    pub fn limit_active(&mut self) -> bool {
        match self.limit_switch.is_active() {
            Ok(active) => active,
            Err(e) => {
                warn!(axis = %self.label, "limit switch unreadable, treating as active: {e}");
                true
            }
        }
    }

    /// De-energise the windings.
    pub fn release_holding_torque(&mut self) {
        if let Err(e) = self.motor.release() {
            warn!(axis = %self.label, "release failed: {e}");
        }
    }

    /// Administrative override of the home state.
    ///
    /// Marking home zeroes the position; clearing it adopts `position` when
    /// one is supplied and keeps the tracked value otherwise.
    pub fn set_home_state(&mut self, is_home: bool, position: Option<f64>) {
        self.at_home = is_home;
        if is_home {
            self.position = 0.0;
            self.state = AxisState::Homed;
        } else {
            if let Some(position) = position {
                self.position = position;
            }
            self.state = AxisState::Unhomed;
        }
        debug!(axis = %self.label, is_home, position = self.position, "home state set");
    }

    /// Step forward off the limit switch ("away").
    ///
    /// Returns `true` when the switch is clear, at once if it already was.
    /// On success the position is zeroed and torque released. Only the
    /// cancellation flags are polled; a switch that stays active beyond
    /// `max_clear_microsteps` also gives `false`.
    pub fn clear_limit_switch(&mut self, interlock: &Interlock) -> bool {
        self.clear_limit(interlock).is_ok()
    }

    fn clear_limit(&mut self, interlock: &Interlock) -> Result<(), StopCause> {
        if !self.limit_active() {
            return Ok(());
        }
        let mut taken = 0u32;
        while self.limit_active() {
            if let Some(cause) = interlock.check_cancellation() {
                warn!(axis = %self.label, %cause, "clearing limit switch cancelled");
                self.release_holding_torque();
                return Err(cause);
            }
            if taken >= self.params.max_clear_microsteps {
                warn!(axis = %self.label, taken, "limit switch still active, giving up");
                self.release_holding_torque();
                return Err(StopCause::LimitSwitch);
            }
            if let Err(e) = self
                .motor
                .step(1, Direction::Forward, StepStyle::Microstep)
            {
                warn!(axis = %self.label, "motor fault while clearing limit switch: {e}");
                self.release_holding_torque();
                return Err(StopCause::DriverFault);
            }
            taken += 1;
        }
        trace!(axis = %self.label, microsteps = taken, "off the limit switch");
        self.position = 0.0;
        self.release_holding_torque();
        Ok(())
    }

    /// Relative move of `distance` steps ("stepMotor").
    ///
    /// Forward moves are clamped so the position never passes `limit`;
    /// backward moves are bounded by the limit switch alone. Clears the home
    /// flag. An interrupted move releases torque and leaves `position` at
    /// the distance actually travelled.
    pub fn move_by(&mut self, distance: f64, interlock: &Interlock) -> MoveOutcome {
        if distance == 0.0 || !distance.is_finite() {
            return MoveOutcome::IDLE;
        }
        let direction = Direction::of(distance);
        self.direction = direction;
        self.state = AxisState::Moving;
        let start = self.position;

        let outcome = match self.clear_limit(interlock) {
            Ok(()) => self.execute(direction, distance.abs(), interlock),
            Err(cause) => MoveOutcome {
                travelled: 0.0,
                stop: Some(cause),
            },
        };

        self.at_home = false;
        self.state = AxisState::Stopped;
        if let Some(cause) = outcome.stop {
            if cause != StopCause::LimitSwitch {
                warn!(axis = %self.label, %cause, travelled = outcome.travelled, "move interrupted");
            }
            self.release_holding_torque();
        }
        debug!(
            axis = %self.label,
            requested = distance,
            travelled = outcome.travelled,
            from = start,
            to = self.position,
            "move finished"
        );
        outcome
    }

    fn execute(&mut self, direction: Direction, magnitude: f64, interlock: &Interlock) -> MoveOutcome {
        let mps = self.params.microsteps_per_step;
        let mps_f = f64::from(mps);
        let mut microsteps = (magnitude * mps_f).round().min(f64::from(u32::MAX)) as u64;
        if direction == Direction::Forward {
            let room = ((f64::from(self.params.limit) - self.position) * mps_f)
                .floor()
                .max(0.0) as u64;
            if microsteps > room {
                debug!(axis = %self.label, requested = magnitude, room = room as f64 / mps_f, "move clamped");
                microsteps = room;
            }
        }
        let whole = (microsteps / u64::from(mps)) as u32;
        let fraction = (microsteps % u64::from(mps)) as u32;
        let overshoot = if direction == Direction::Forward && whole + fraction > 0 {
            self.params.overshoot
        } else {
            0
        };

        let mut travelled = 0.0;

        let main = self.increments(direction, whole + overshoot, StepStyle::Double, interlock);
        travelled += direction.sign() * f64::from(main.completed);
        if let Some(cause) = main.stop {
            return self.interrupted(travelled, cause, interlock);
        }

        if overshoot > 0 {
            let back = self.increments(direction.reversed(), overshoot, StepStyle::Double, interlock);
            travelled -= direction.sign() * f64::from(back.completed);
            if let Some(cause) = back.stop {
                return self.interrupted(travelled, cause, interlock);
            }
        }

        let micro = self.increments(direction, fraction, StepStyle::Microstep, interlock);
        travelled += direction.sign() * f64::from(micro.completed) / mps_f;
        if let Some(cause) = micro.stop {
            return self.interrupted(travelled, cause, interlock);
        }

        // Arriving exactly on the switch.
        if self.limit_active() {
            return self.interrupted(travelled, StopCause::LimitSwitch, interlock);
        }

        MoveOutcome {
            travelled,
            stop: None,
        }
    }

    /// Run `count` units in `direction`, tracking position as they complete.
    fn increments(
        &mut self,
        direction: Direction,
        count: u32,
        style: StepStyle,
        interlock: &Interlock,
    ) -> LoopOutcome {
        let unit = match style {
            StepStyle::Microstep => 1.0 / f64::from(self.params.microsteps_per_step),
            StepStyle::Interleave => 0.5,
            StepStyle::Single | StepStyle::Double => 1.0,
        };
        let increment = self.params.step_size;
        let label = self.label;
        let Self {
            motor,
            limit_switch,
            position,
            ..
        } = self;
        run_increments(
            count,
            increment,
            || {
                let on_switch = limit_switch.is_active().unwrap_or_else(|e| {
                    warn!(axis = %label, "limit switch unreadable, treating as active: {e}");
                    true
                });
                if on_switch {
                    Some(StopCause::LimitSwitch)
                } else {
                    interlock.check()
                }
            },
            |n| -> Result<(), DriverError> {
                motor.step(n, direction, style)?;
                *position += direction.sign() * f64::from(n) * unit;
                Ok(())
            },
        )
    }

    fn interrupted(&mut self, travelled: f64, cause: StopCause, interlock: &Interlock) -> MoveOutcome {
        let stop = if cause == StopCause::LimitSwitch {
            trace!(axis = %self.label, "on the limit switch");
            match self.clear_limit(interlock) {
                Ok(()) => StopCause::LimitSwitch,
                Err(cause) => cause,
            }
        } else {
            cause
        };
        MoveOutcome {
            travelled,
            stop: Some(stop),
        }
    }

    /// Back onto the limit switch and zero there ("home").
    ///
    /// Does nothing while the switch is already active.
    pub fn home(&mut self, interlock: &Interlock) -> HomingOutcome {
        if self.limit_active() {
            debug!(axis = %self.label, "already on the limit switch, homing skipped");
            return HomingOutcome::AlreadyOnSensor;
        }
        self.seek_home(interlock)
    }

    /// Home regardless of the current switch state.
    ///
    /// Starting on the switch, the axis first steps off it and then backs
    /// onto it again.
    pub fn rehome(&mut self, interlock: &Interlock) -> HomingOutcome {
        self.seek_home(interlock)
    }

    fn seek_home(&mut self, interlock: &Interlock) -> HomingOutcome {
        let travel = f64::from(self.params.limit) + 1.0;
        let outcome = self.move_by(-travel, interlock);
        let result = match outcome.stop {
            Some(StopCause::LimitSwitch) if !self.limit_active() => {
                self.set_home_state(true, None);
                info!(axis = %self.label, "homed");
                HomingOutcome::Homed
            }
            Some(StopCause::LimitSwitch) => HomingOutcome::Interrupted(StopCause::LimitSwitch),
            Some(cause) => HomingOutcome::Interrupted(cause),
            None => {
                warn!(axis = %self.label, travel, "limit switch not found");
                HomingOutcome::SwitchNotFound
            }
        };
        self.release_holding_torque();
        result
    }
}

impl fmt::Debug for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Axis")
            .field("label", &self.label)
            .field("position", &self.position)
            .field("direction", &self.direction)
            .field("at_home", &self.at_home)
            .field("state", &self.state)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// ─── Presence ───────────────────────────────────────────────────────

/// An axis position on the fixture: populated or not.
#[derive(Debug)]
pub enum AxisSlot {
    /// Motor and limit switch acquired.
    Present(Axis),
    /// Not populated or failed to assemble.
    Absent {
        /// Axis that would sit here.
        label: AxisLabel,
        /// Why it is missing.
        reason: String,
    },
}

impl AxisSlot {
    pub fn absent(label: AxisLabel, reason: impl Into<String>) -> Self {
        Self::Absent {
            label,
            reason: reason.into(),
        }
    }

    pub fn label(&self) -> AxisLabel {
        match self {
            Self::Present(axis) => axis.label(),
            Self::Absent { label, .. } => *label,
        }
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn axis(&self) -> Option<&Axis> {
        match self {
            Self::Present(axis) => Some(axis),
            Self::Absent { .. } => None,
        }
    }

    pub fn axis_mut(&mut self) -> Option<&mut Axis> {
        match self {
            Self::Present(axis) => Some(axis),
            Self::Absent { .. } => None,
        }
    }
}
