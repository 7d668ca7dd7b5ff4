//! Prelude module for common re-exports.
//!
//! ```rust
//! use oduqc_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::motion::config::{
    AxisConfig, BoardConfig, FixtureConfig, MotionSettings, PRIMARY_BOARD, SECONDARY_BOARD,
};
pub use crate::motion::geometry::Geometry;

// ─── Motion Types ───────────────────────────────────────────────────
pub use crate::consts::MAX_AXES;
pub use crate::motion::types::{AxisLabel, Direction, FixtureType, StepStyle};

// ─── Drivers ────────────────────────────────────────────────────────
pub use crate::motion::driver::{
    DriverError, DriverFactory, FixtureDriver, LimitSwitch, MotorHandle, StepperBoard,
};

// ─── Signals & Commands ─────────────────────────────────────────────
pub use crate::command::{Command, CommandLatch, NoStopRequests, StopRequest};
pub use crate::signals::{CancelSignals, CancellationSource};
