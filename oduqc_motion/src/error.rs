//! Motion error types.
//!
//! Only caller mistakes and assembly problems are errors. Absent axes,
//! truncated moves and interruptions are reported as data
//! (see [`crate::axis::MoveOutcome`] and [`crate::coordinator::SequenceOutcome`]).

use oduqc_common::config::ConfigError;
use oduqc_common::consts::CALIBRATION_INDEX;
use oduqc_common::motion::driver::DriverError;
use oduqc_common::motion::types::UnknownAxisLabel;
use thiserror::Error;

/// Error type for motion operations.
#[derive(Debug, Clone, Error)]
pub enum MotionError {
    /// Position index outside the connector table.
    #[error("Unknown position index {0} (valid: 0..={max})", max = CALIBRATION_INDEX)]
    UnknownPosition(u32),

    /// Axis label not recognised.
    #[error(transparent)]
    UnknownAxis(#[from] UnknownAxisLabel),

    /// Fixture configuration rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Driver could not be created.
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}
