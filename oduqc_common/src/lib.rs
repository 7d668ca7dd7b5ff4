//! ODUQC Common Library
//!
//! Shared building blocks for the ODUQC fixture motion workspace.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Production fixture constants (limits, depths, connector tables)
//! - [`motion`] - Axis types, fixture configuration and driver capability traits
//! - [`signals`] - Process-wide cancellation signals (emergency stop, fatal condition)
//! - [`command`] - Operator command record and stop-request polling
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use oduqc_common::prelude::*;
//!
//! let config = FixtureConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod command;
pub mod config;
pub mod consts;
pub mod motion;
pub mod prelude;
pub mod signals;
