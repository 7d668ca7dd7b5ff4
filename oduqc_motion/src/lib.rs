//! # ODUQC Motion Library
//!
//! Motion core of the ODUQC connector test fixture. Positions a four-axis
//! head (engagement X, long-travel Y, vertical Z, rotation R) against the
//! connectors of a device under test, within hard travel limits, stopping
//! within one step on an operator stop, an emergency stop or a fatal
//! condition.
//!
//! # Module Structure
//!
//! - [`axis`] - Bounded, cancellable, backlash-compensated stepping and homing
//! - [`interlock`] - Per-increment stop polling
//! - [`targets`] - Position index to per-axis targets
//! - [`coordinator`] - Collision-safe multi-axis sequencing
//! - [`assembly`] - Coordinator construction from config and a driver
//! - [`report`] - Position report
//! - [`error`] - Error types
//!
//! ## Data Flow
//!
//! ```text
//!  dispatch ──► MotionCoordinator ──► targets::target_for
//!                     │
//!                     ▼ one axis at a time
//!                   Axis ──► Interlock (limit, stop, e-stop, fatal)
//!                     │
//!                     ▼
//!               MotorHandle / LimitSwitch  (oduqc_hal driver)
//! ```

pub mod assembly;
pub mod axis;
pub mod coordinator;
pub mod error;
pub mod interlock;
pub mod report;
pub mod targets;

pub use assembly::{AssemblyReport, assemble};
pub use axis::{Axis, AxisSlot, AxisState, HomingOutcome, MoveOutcome};
pub use coordinator::{MotionCoordinator, SequenceOutcome};
pub use error::MotionError;
pub use interlock::{Interlock, StopCause};
pub use report::PositionReport;
