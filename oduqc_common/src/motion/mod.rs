//! Motion domain: axis types, fixture configuration, geometry and driver traits.

pub mod config;
pub mod driver;
pub mod geometry;
pub mod types;
