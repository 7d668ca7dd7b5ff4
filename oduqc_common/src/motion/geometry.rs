//! Fixture geometry: engagement depths, head orientations and connector tables.
//!
//! # TOML Example
//!
//! ```toml
//! [geometry]
//! engage_depth = 950.0
//! plug_clearance = 500.0
//! connectors_odd = [0.0, 46.0, ...]   # 20 entries
//! ```

use serde::{Deserialize, Serialize};

use crate::consts::{
    CALIBRATION_DEPTH, CONNECTOR_SLOTS, CONNECTOR_TABLE, ENGAGE_DEPTH, PLUG_CLEARANCE,
    R_STEPS_TO_0, R_STEPS_TO_180, R_STEPS_TO_90, STEPS_PER_DEGREE, Z_HIGH_CONNECTORS,
    Z_LOW_CONNECTORS, Z_ROTATION_OFFSET,
};
use crate::motion::types::FixtureType;

fn default_engage_depth() -> f64 {
    ENGAGE_DEPTH
}
fn default_plug_clearance() -> f64 {
    PLUG_CLEARANCE
}
fn default_calibration_depth() -> f64 {
    CALIBRATION_DEPTH
}
fn default_z_low() -> f64 {
    Z_LOW_CONNECTORS
}
fn default_z_high() -> f64 {
    Z_HIGH_CONNECTORS
}
fn default_z_rotation_offset() -> f64 {
    Z_ROTATION_OFFSET
}
fn default_r_0() -> f64 {
    R_STEPS_TO_0
}
fn default_r_90() -> f64 {
    R_STEPS_TO_90
}
fn default_r_180() -> f64 {
    R_STEPS_TO_180
}
fn default_steps_per_degree() -> f64 {
    STEPS_PER_DEGREE
}
fn default_connectors_odd() -> [f64; CONNECTOR_SLOTS] {
    CONNECTOR_TABLE[0]
}
fn default_connectors_even() -> [f64; CONNECTOR_SLOTS] {
    CONNECTOR_TABLE[1]
}

/// Absolute tracked-position targets that define where things are on the fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Engagement axis depth at which the head is plugged in.
    #[serde(default = "default_engage_depth")]
    pub engage_depth: f64,
    /// How far short of the device the head travels between connectors.
    #[serde(default = "default_plug_clearance")]
    pub plug_clearance: f64,
    /// Engagement depth against the calibration light guide.
    #[serde(default = "default_calibration_depth")]
    pub calibration_depth: f64,
    /// Vertical target for connectors 1..=16 and calibration.
    #[serde(default = "default_z_low")]
    pub z_low_connectors: f64,
    /// Vertical target for connectors 17/18, head upper horizontal.
    #[serde(default = "default_z_high")]
    pub z_high_connectors: f64,
    /// Additional vertical travel when the head is flipped to 180 degrees.
    #[serde(default = "default_z_rotation_offset")]
    pub z_rotation_offset: f64,
    /// Rotation target: upper horizontal.
    #[serde(default = "default_r_0")]
    pub r_steps_to_0: f64,
    /// Rotation target: vertical.
    #[serde(default = "default_r_90")]
    pub r_steps_to_90: f64,
    /// Rotation target: lower horizontal (flipped).
    #[serde(default = "default_r_180")]
    pub r_steps_to_180: f64,
    /// Rotation axis steps per degree.
    #[serde(default = "default_steps_per_degree")]
    pub steps_per_degree: f64,
    /// Long-travel targets for odd fixtures.
    #[serde(default = "default_connectors_odd")]
    pub connectors_odd: [f64; CONNECTOR_SLOTS],
    /// Long-travel targets for even fixtures.
    #[serde(default = "default_connectors_even")]
    pub connectors_even: [f64; CONNECTOR_SLOTS],
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            engage_depth: ENGAGE_DEPTH,
            plug_clearance: PLUG_CLEARANCE,
            calibration_depth: CALIBRATION_DEPTH,
            z_low_connectors: Z_LOW_CONNECTORS,
            z_high_connectors: Z_HIGH_CONNECTORS,
            z_rotation_offset: Z_ROTATION_OFFSET,
            r_steps_to_0: R_STEPS_TO_0,
            r_steps_to_90: R_STEPS_TO_90,
            r_steps_to_180: R_STEPS_TO_180,
            steps_per_degree: STEPS_PER_DEGREE,
            connectors_odd: CONNECTOR_TABLE[0],
            connectors_even: CONNECTOR_TABLE[1],
        }
    }
}

impl Geometry {
    /// Connector table row for a fixture type.
    #[inline]
    pub fn connectors(&self, fixture: FixtureType) -> &[f64; CONNECTOR_SLOTS] {
        match fixture {
            FixtureType::Odd => &self.connectors_odd,
            FixtureType::Even => &self.connectors_even,
        }
    }

    /// Engagement depth the head withdraws to before any travel.
    #[inline]
    pub fn withdrawal_depth(&self) -> f64 {
        self.engage_depth - self.plug_clearance
    }

    /// Pre-engagement offset used when presenting to the calibration guide.
    #[inline]
    pub fn calibration_withdrawal_depth(&self) -> f64 {
        self.calibration_depth - self.plug_clearance
    }

    /// Vertical target with the head flipped to 180 degrees.
    #[inline]
    pub fn z_flipped(&self) -> f64 {
        self.z_high_connectors + self.z_rotation_offset
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> Result<(), String> {
        let scalars = [
            ("engage_depth", self.engage_depth),
            ("plug_clearance", self.plug_clearance),
            ("calibration_depth", self.calibration_depth),
            ("z_low_connectors", self.z_low_connectors),
            ("z_high_connectors", self.z_high_connectors),
            ("z_rotation_offset", self.z_rotation_offset),
            ("r_steps_to_0", self.r_steps_to_0),
            ("r_steps_to_90", self.r_steps_to_90),
            ("r_steps_to_180", self.r_steps_to_180),
        ];
        for (name, value) in scalars {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("geometry.{name} must be a finite, non-negative value"));
            }
        }
        if self.plug_clearance > self.engage_depth {
            return Err("geometry.plug_clearance exceeds engage_depth".to_string());
        }
        if self.calibration_depth < self.engage_depth {
            return Err("geometry.calibration_depth is shallower than engage_depth".to_string());
        }
        if !(self.steps_per_degree.is_finite() && self.steps_per_degree > 0.0) {
            return Err("geometry.steps_per_degree must be positive".to_string());
        }
        for (name, row) in [
            ("connectors_odd", &self.connectors_odd),
            ("connectors_even", &self.connectors_even),
        ] {
            if row[0] != 0.0 {
                return Err(format!("geometry.{name}[0] must be 0 (home)"));
            }
            if let Some(i) = row.iter().position(|v| !v.is_finite() || *v < 0.0) {
                return Err(format!("geometry.{name}[{i}] must be a finite, non-negative value"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_fixture() {
        let g = Geometry::default();
        assert_eq!(g.withdrawal_depth(), 450.0);
        assert_eq!(g.calibration_withdrawal_depth(), 1450.0);
        assert_eq!(g.z_flipped(), 1610.0);
        assert_eq!(g.connectors(FixtureType::Odd)[1], 46.0);
        assert_eq!(g.connectors(FixtureType::Even)[1], 2370.0);
        assert!(g.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let g: Geometry = toml::from_str("engage_depth = 1000.0").unwrap();
        assert_eq!(g.engage_depth, 1000.0);
        assert_eq!(g.plug_clearance, PLUG_CLEARANCE);
        assert_eq!(g.connectors_odd, CONNECTOR_TABLE[0]);
    }

    #[test]
    fn short_connector_table_is_a_parse_error() {
        let result = toml::from_str::<Geometry>("connectors_odd = [0.0, 1.0]");
        assert!(result.is_err());
    }

    #[test]
    fn nonzero_home_entry_rejected() {
        let mut g = Geometry::default();
        g.connectors_even[0] = 5.0;
        assert!(g.validate().unwrap_err().contains("connectors_even[0]"));
    }

    #[test]
    fn clearance_deeper_than_engagement_rejected() {
        let g = Geometry {
            plug_clearance: 2000.0,
            ..Default::default()
        };
        assert!(g.validate().is_err());
    }
}
