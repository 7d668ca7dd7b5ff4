//! # ODUQC HAL Library
//!
//! Fixture driver layer with a pluggable driver architecture.
//!
//! Drivers implement the `FixtureDriver` trait defined in
//! `oduqc_common::motion::driver` and hand out `StepperBoard`, `MotorHandle`
//! and `LimitSwitch` trait objects. The motion core never sees a concrete
//! driver type.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations (`motor_shield`, `simulation`)
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       oduqc_hal                            │
//! │  ┌──────────────────┐     ┌─────────────────────────────┐  │
//! │  │ DriverRegistry   │────►│ FixtureDriver (trait object)│  │
//! │  │ name → factory   │     └──────┬───────────────┬──────┘  │
//! │  └──────────────────┘            │               │         │
//! │                                  ▼               ▼         │
//! │                       StepperBoard ×2     LimitSwitch ×4   │
//! │                            │                               │
//! │                            ▼                               │
//! │                     MotorHandle ×2 per board               │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
