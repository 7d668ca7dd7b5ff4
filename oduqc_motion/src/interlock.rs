//! Per-increment stop polling.
//!
//! Every motion is cut into increments. Before each one the axis asks
//! whether it may continue: its own limit sensor first, then the
//! [`Interlock`] (the two process-wide cancellation flags and the operator
//! stop request). [`run_increments`] is that loop with the question and the
//! actuation injected, so the stop contract can be exercised without motors.

use oduqc_common::command::{NoStopRequests, StopRequest};
use oduqc_common::motion::driver::DriverError;
use oduqc_common::signals::{CancelSignals, CancellationSource};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{trace, warn};

/// Why a motion ended before covering its full distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StopCause {
    /// The zero-reference limit sensor became active.
    LimitSwitch,
    /// The operator sent a stop command.
    OperatorStop,
    /// The emergency-stop flag is raised.
    EmergencyStop,
    /// The fatal-condition flag is raised.
    FatalCondition,
    /// The motor driver reported an error.
    DriverFault,
}

impl StopCause {
    /// Whether the rest of a multi-axis sequence must be abandoned.
    ///
    /// A limit switch stop only ends the move of the axis that hit it.
    #[inline]
    pub const fn aborts_sequence(&self) -> bool {
        !matches!(self, Self::LimitSwitch)
    }
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::LimitSwitch => "limit switch",
            Self::OperatorStop => "operator stop",
            Self::EmergencyStop => "emergency stop",
            Self::FatalCondition => "fatal condition",
            Self::DriverFault => "driver fault",
        };
        f.write_str(text)
    }
}

/// Cancellation flags plus the operator stop request.
///
/// Cheap to clone; every clone observes the same flags.
#[derive(Clone)]
pub struct Interlock {
    signals: Arc<CancellationSource>,
    stop: Arc<dyn StopRequest>,
}

impl Interlock {
    pub fn new(signals: Arc<CancellationSource>, stop: Arc<dyn StopRequest>) -> Self {
        Self { signals, stop }
    }

    /// Interlock without an operator command stream.
    pub fn unattended(signals: Arc<CancellationSource>) -> Self {
        Self::new(signals, Arc::new(NoStopRequests))
    }

    #[inline]
    pub fn signals(&self) -> &Arc<CancellationSource> {
        &self.signals
    }

    /// Emergency stop and fatal condition only.
    pub fn check_cancellation(&self) -> Option<StopCause> {
        let raised = self.signals.snapshot();
        if raised.contains(CancelSignals::EMERGENCY_STOP) {
            Some(StopCause::EmergencyStop)
        } else if raised.contains(CancelSignals::FATAL_CONDITION) {
            Some(StopCause::FatalCondition)
        } else {
            None
        }
    }

    /// Cancellation flags, then the operator stop request.
    ///
    /// Polling the operator request may consume it.
    pub fn check(&self) -> Option<StopCause> {
        self.check_cancellation().or_else(|| {
            self.stop
                .stop_requested()
                .then_some(StopCause::OperatorStop)
        })
    }
}

impl fmt::Debug for Interlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interlock")
            .field("signals", &self.signals.snapshot())
            .finish_non_exhaustive()
    }
}

/// Result of [`run_increments`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Units actually actuated.
    pub completed: u32,
    /// Why the loop ended early, if it did.
    pub stop: Option<StopCause>,
}

impl LoopOutcome {
    #[inline]
    pub const fn is_complete(&self) -> bool {
        self.stop.is_none()
    }
}

/// Actuate `total` units in increments of at most `increment`.
///
/// `poll` runs before every increment; the first `Some` ends the loop
/// without actuating. An actuation error ends it with
/// `StopCause::DriverFault`. `completed` never counts a failed increment.
pub fn run_increments<P, A>(total: u32, increment: u32, mut poll: P, mut actuate: A) -> LoopOutcome
where
    P: FnMut() -> Option<StopCause>,
    A: FnMut(u32) -> Result<(), DriverError>,
{
    let increment = increment.max(1);
    let mut completed = 0;
    while completed < total {
        if let Some(cause) = poll() {
            trace!(completed, total, %cause, "motion stopped");
            return LoopOutcome {
                completed,
                stop: Some(cause),
            };
        }
        let count = increment.min(total - completed);
        if let Err(e) = actuate(count) {
            warn!(completed, total, "motor fault: {e}");
            return LoopOutcome {
                completed,
                stop: Some(StopCause::DriverFault),
            };
        }
        completed += count;
    }
    LoopOutcome {
        completed,
        stop: None,
    }
}
