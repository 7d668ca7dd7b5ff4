//! Multi-axis sequencing, engagement state and named positions.
//!
//! The coordinator is the only owner of the axes. Every operation drives
//! at most one axis at a time, in an order that keeps the head clear of the
//! fixture:
//!
//! ```text
//!   withdraw X ─► Y ─► X ─► R ─► Z        (orientation already right)
//!   withdraw X ─► Y ─► X ─► Z ─► R        (head flips over)
//! ```
//!
//! Missing axes are skipped. A sub-move that ends on an operator stop,
//! emergency stop, fatal condition or motor fault ends the whole operation.

use oduqc_common::consts::{CALIBRATION_INDEX, MAX_AXES};
use oduqc_common::motion::driver::StepperBoard;
use oduqc_common::motion::geometry::Geometry;
use oduqc_common::motion::types::{AxisLabel, FixtureType};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::axis::{Axis, AxisSlot};
use crate::error::MotionError;
use crate::interlock::{Interlock, StopCause};
use crate::report::{AxisReading, PositionReport};
use crate::targets::{Target, target_for};

/// Homing order when every axis is homed.
const HOMING_ORDER: [AxisLabel; MAX_AXES] = [AxisLabel::Z, AxisLabel::X, AxisLabel::R, AxisLabel::Y];

/// Re-homing order at start-up.
const RESET_ORDER: [AxisLabel; MAX_AXES] = [AxisLabel::X, AxisLabel::R, AxisLabel::Z, AxisLabel::Y];

/// How a coordinator operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SequenceOutcome {
    Completed,
    /// Stopped on `axis`; later sub-moves were not attempted.
    Interrupted { axis: AxisLabel, cause: StopCause },
}

impl SequenceOutcome {
    #[inline]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for SequenceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Interrupted { axis, cause } => write!(f, "interrupted on {axis}: {cause}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interruption {
    axis: AxisLabel,
    cause: StopCause,
}

type Sequence = Result<(), Interruption>;

/// Owner of the fixture axes and the boards that drive them.
pub struct MotionCoordinator {
    axes: [AxisSlot; MAX_AXES],
    boards: Vec<Box<dyn StepperBoard>>,
    geometry: Geometry,
    settle: Duration,
    interlock: Interlock,
    fixture_type: FixtureType,
    plugged_in: bool,
}

impl MotionCoordinator {
    /// Build from assembled slots. Labels without a slot become absent.
    pub fn new(
        slots: Vec<AxisSlot>,
        boards: Vec<Box<dyn StepperBoard>>,
        geometry: Geometry,
        settle: Duration,
        interlock: Interlock,
    ) -> Self {
        let mut axes = AxisLabel::ALL.map(|label| AxisSlot::absent(label, "not configured"));
        for slot in slots {
            let index = slot.label().index();
            axes[index] = slot;
        }
        Self {
            axes,
            boards,
            geometry,
            settle,
            interlock,
            fixture_type: FixtureType::default(),
            plugged_in: false,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    pub fn slot(&self, label: AxisLabel) -> &AxisSlot {
        &self.axes[label.index()]
    }

    pub fn axis(&self, label: AxisLabel) -> Option<&Axis> {
        self.axes[label.index()].axis()
    }

    pub fn is_present(&self, label: AxisLabel) -> bool {
        self.axes[label.index()].is_present()
    }

    #[inline]
    pub fn fixture_type(&self) -> FixtureType {
        self.fixture_type
    }

    #[inline]
    pub fn is_plugged_in(&self) -> bool {
        self.plugged_in
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn interlock(&self) -> &Interlock {
        &self.interlock
    }

    /// Names of the boards backing at least one axis.
    pub fn board_names(&self) -> Vec<&str> {
        self.boards.iter().map(|b| b.name()).collect()
    }

    // ─── Primitives ─────────────────────────────────────────────────

    fn move_axis(&mut self, label: AxisLabel, delta: f64) -> Sequence {
        let Some(axis) = self.axes[label.index()].axis_mut() else {
            debug!(axis = %label, "axis absent, move skipped");
            return Ok(());
        };
        let outcome = axis.move_by(delta, &self.interlock);
        match outcome.abort_cause() {
            Some(cause) => Err(Interruption { axis: label, cause }),
            None => Ok(()),
        }
    }

    fn move_axis_to(&mut self, label: AxisLabel, target: f64) -> Sequence {
        let Some(position) = self.axis(label).map(Axis::position) else {
            return Ok(());
        };
        self.move_axis(label, target - position)
    }

    fn home_axis(&mut self, label: AxisLabel, force: bool) -> Sequence {
        let Some(axis) = self.axes[label.index()].axis_mut() else {
            return Ok(());
        };
        if !force && axis.is_home() {
            debug!(axis = %label, "already home");
            return Ok(());
        }
        let outcome = if force {
            axis.rehome(&self.interlock)
        } else {
            axis.home(&self.interlock)
        };
        match outcome.interruption().filter(StopCause::aborts_sequence) {
            Some(cause) => Err(Interruption { axis: label, cause }),
            None => Ok(()),
        }
    }

    fn settle(&self) {
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
    }

    fn engagement_depth(&self) -> Option<f64> {
        self.axis(AxisLabel::X).map(Axis::position)
    }

    fn refresh_plugged_in(&mut self) {
        let withdrawal = self.geometry.withdrawal_depth();
        self.plugged_in = self.engagement_depth().is_some_and(|x| x > withdrawal);
    }

    // ─── Operations ─────────────────────────────────────────────────

    /// Withdraw and re-home every axis regardless of its home flag.
    pub fn reset_home(&mut self) -> SequenceOutcome {
        info!("resetting home on all axes");
        let result = self.withdraw().and_then(|()| {
            RESET_ORDER
                .into_iter()
                .try_for_each(|label| self.home_axis(label, true))
        });
        self.finish("reset home", result)
    }

    /// Unlock, withdraw and home one axis, or every axis not yet home.
    pub fn go_home(&mut self, label: Option<AxisLabel>) -> SequenceOutcome {
        self.release_all();
        let result = self.withdraw().and_then(|()| match label {
            Some(label) => self.home_axis(label, false),
            None => HOMING_ORDER
                .into_iter()
                .try_for_each(|label| self.home_axis(label, false)),
        });
        self.finish("home", result)
    }

    /// Drive to a named position; 0 is home.
    pub fn move_to_position(&mut self, index: u32) -> Result<SequenceOutcome, MotionError> {
        let target = target_for(&self.geometry, self.fixture_type, index)
            .ok_or(MotionError::UnknownPosition(index))?;
        if index == 0 {
            return Ok(self.go_home(None));
        }
        let result = self.withdraw().and_then(|()| self.approach(&target));
        if result.is_ok() {
            info!(
                index,
                fixture = %self.fixture_type,
                orientation = ?target.orientation,
                "at position"
            );
        }
        Ok(self.finish("move to position", result))
    }

    fn approach(&mut self, target: &Target) -> Sequence {
        debug!(index = target.index, flip = target.requires_flip, "approaching");
        // Orientation needs both R and Z; one without the other stays put.
        let orient = self.is_present(AxisLabel::R) && self.is_present(AxisLabel::Z);
        target
            .sequence()
            .into_iter()
            .filter(|label| orient || !matches!(label, AxisLabel::R | AxisLabel::Z))
            .try_for_each(|label| self.move_axis_to(label, target.coordinate(label)))
    }

    /// Plug the head in at the engagement or calibration depth.
    pub fn engage(&mut self, calibration: bool) -> SequenceOutcome {
        if self.plugged_in || !self.is_present(AxisLabel::X) {
            return SequenceOutcome::Completed;
        }
        let depth = if calibration {
            self.geometry.calibration_depth
        } else {
            self.geometry.engage_depth
        };
        let result = self.move_axis_to(AxisLabel::X, depth);
        if result.is_ok() {
            self.settle();
            self.plugged_in = true;
            info!(depth, calibration, "engaged");
        } else {
            self.refresh_plugged_in();
        }
        self.finish("engage", result)
    }

    /// Withdraw the head to the travel depth.
    pub fn disengage(&mut self) -> SequenceOutcome {
        let result = self.withdraw();
        self.finish("disengage", result)
    }

    fn withdraw(&mut self) -> Sequence {
        let Some(depth) = self.engagement_depth() else {
            return Ok(());
        };
        let withdrawal = self.geometry.withdrawal_depth();
        let result = if depth > withdrawal {
            let result = self.move_axis(AxisLabel::X, withdrawal - depth);
            if result.is_ok() {
                self.settle();
                info!(depth = withdrawal, "disengaged");
            }
            result
        } else {
            Ok(())
        };
        self.refresh_plugged_in();
        result
    }

    /// Relative rotation of the head.
    pub fn rotate_by(&mut self, degrees: f64) -> SequenceOutcome {
        if degrees == 0.0 {
            return SequenceOutcome::Completed;
        }
        let steps = degrees * self.geometry.steps_per_degree;
        let result = self.move_axis(AxisLabel::R, steps);
        self.finish("rotate", result)
    }

    /// Single-axis relative move.
    pub fn step_axis(&mut self, label: AxisLabel, steps: f64) -> SequenceOutcome {
        let result = self.move_axis(label, steps);
        self.finish("step", result)
    }

    /// Select the connector table; odd values pick the odd table.
    pub fn set_fixture_type(&mut self, raw: i64) -> FixtureType {
        self.fixture_type = FixtureType::from_raw(raw);
        info!(raw, fixture = %self.fixture_type, "fixture type set");
        self.fixture_type
    }

    pub fn release_all(&mut self) {
        for axis in self.axes.iter_mut().filter_map(AxisSlot::axis_mut) {
            axis.release_holding_torque();
        }
    }

    pub fn release(&mut self, label: AxisLabel) {
        if let Some(axis) = self.axes[label.index()].axis_mut() {
            axis.release_holding_torque();
        }
    }

    /// Tracked position of every axis.
    pub fn report_position(&self) -> PositionReport {
        let mut report = PositionReport::new(self.fixture_type, self.plugged_in);
        for slot in &self.axes {
            report.push(match slot {
                AxisSlot::Present(axis) => AxisReading::present(axis),
                AxisSlot::Absent { label, .. } => AxisReading::absent(*label),
            });
        }
        report
    }

    /// Move to `index`, plug in, dwell, withdraw and go home.
    pub fn check_placement(
        &mut self,
        index: u32,
        dwell: Duration,
    ) -> Result<SequenceOutcome, MotionError> {
        let outcome = self.move_to_position(index)?;
        if !outcome.is_completed() {
            return Ok(outcome);
        }
        let outcome = self.engage(index == CALIBRATION_INDEX);
        if !outcome.is_completed() {
            return Ok(outcome);
        }
        std::thread::sleep(dwell);
        let outcome = self.disengage();
        if !outcome.is_completed() {
            return Ok(outcome);
        }
        Ok(self.go_home(None))
    }

    /// Home everything and drop holding torque for shutdown.
    pub fn park(&mut self) -> SequenceOutcome {
        let outcome = self.go_home(None);
        self.release_all();
        outcome
    }

    fn finish(&mut self, operation: &str, result: Sequence) -> SequenceOutcome {
        match result {
            Ok(()) => SequenceOutcome::Completed,
            Err(Interruption { axis, cause }) => {
                warn!(operation, axis = %axis, %cause, "sequence aborted");
                self.release_all();
                SequenceOutcome::Interrupted { axis, cause }
            }
        }
    }
}

impl fmt::Debug for MotionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MotionCoordinator")
            .field("axes", &self.axes)
            .field("boards", &self.board_names())
            .field("fixture_type", &self.fixture_type)
            .field("plugged_in", &self.plugged_in)
            .field("interlock", &self.interlock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oduqc_common::signals::CancellationSource;
    use std::sync::Arc;

    fn empty() -> MotionCoordinator {
        let interlock = Interlock::unattended(Arc::new(CancellationSource::new()));
        MotionCoordinator::new(
            Vec::new(),
            Vec::new(),
            Geometry::default(),
            Duration::ZERO,
            interlock,
        )
    }

    #[test]
    fn unpopulated_fixture_degrades_to_no_ops() {
        let mut c = empty();
        assert!(AxisLabel::ALL.iter().all(|l| !c.is_present(*l)));
        assert!(c.reset_home().is_completed());
        assert!(c.go_home(Some(AxisLabel::Y)).is_completed());
        assert_eq!(c.move_to_position(5).unwrap(), SequenceOutcome::Completed);
        assert!(c.engage(false).is_completed());
        assert!(!c.is_plugged_in());
        assert!(c.rotate_by(90.0).is_completed());
        assert!(c.step_axis(AxisLabel::Z, 10.0).is_completed());
        c.release_all();
        c.release(AxisLabel::X);
    }

    #[test]
    fn unknown_position_is_rejected() {
        let mut c = empty();
        assert!(matches!(
            c.move_to_position(CALIBRATION_INDEX + 1),
            Err(MotionError::UnknownPosition(20))
        ));
    }

    #[test]
    fn fixture_type_resolution() {
        let mut c = empty();
        assert_eq!(c.set_fixture_type(3), FixtureType::Odd);
        assert_eq!(c.set_fixture_type(4), FixtureType::Even);
        assert_eq!(c.fixture_type(), FixtureType::Even);
    }

    #[test]
    fn absent_slots_carry_a_reason() {
        let c = empty();
        match c.slot(AxisLabel::R) {
            AxisSlot::Absent { label, reason } => {
                assert_eq!(*label, AxisLabel::R);
                assert_eq!(reason, "not configured");
            }
            AxisSlot::Present(_) => panic!("expected absent"),
        }
    }

    #[test]
    fn outcome_display() {
        let outcome = SequenceOutcome::Interrupted {
            axis: AxisLabel::Z,
            cause: StopCause::EmergencyStop,
        };
        assert!(outcome.to_string().starts_with("interrupted on Z"));
        assert_eq!(SequenceOutcome::Completed.to_string(), "completed");
    }
}
