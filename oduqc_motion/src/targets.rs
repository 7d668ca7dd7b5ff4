//! Position-index to per-axis target resolution.
//!
//! | index   | long travel      | engagement       | rotation | vertical            |
//! |---------|------------------|------------------|----------|---------------------|
//! | 0       | 0                | 0                | 0        | 0                   |
//! | 1..=16  | table            | withdrawal       | 90°      | low                 |
//! | 17      | table            | withdrawal       | 180° odd, 0° even | flipped odd, high even |
//! | 18      | table            | withdrawal       | 0° odd, 180° even | high odd, flipped even |
//! | 19      | table            | calib withdrawal | 0°       | low                 |

use oduqc_common::consts::{CALIBRATION_INDEX, LAST_CONNECTOR};
use oduqc_common::motion::geometry::Geometry;
use oduqc_common::motion::types::{AxisLabel, FixtureType};
use serde::Serialize;

/// Head orientation at a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeadOrientation {
    /// Rotation at 0°, head pointing up.
    Upper,
    /// Rotation at 90°.
    Vertical,
    /// Rotation at 180°, head flipped.
    Lower,
}

/// Absolute per-axis positions for one position index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Target {
    pub index: u32,
    pub long_travel: f64,
    pub engagement: f64,
    pub rotation: f64,
    pub vertical: f64,
    pub orientation: HeadOrientation,
    /// Vertical must reach its target before the head turns.
    pub requires_flip: bool,
}

impl Target {
    /// Order the axes are driven in.
    pub const fn sequence(&self) -> [AxisLabel; 4] {
        if self.requires_flip {
            [AxisLabel::Y, AxisLabel::X, AxisLabel::Z, AxisLabel::R]
        } else {
            [AxisLabel::Y, AxisLabel::X, AxisLabel::R, AxisLabel::Z]
        }
    }

    pub const fn coordinate(&self, label: AxisLabel) -> f64 {
        match label {
            AxisLabel::X => self.engagement,
            AxisLabel::Y => self.long_travel,
            AxisLabel::Z => self.vertical,
            AxisLabel::R => self.rotation,
        }
    }
}

/// Resolve `index` for a fixture type; `None` past the calibration index.
pub fn target_for(geometry: &Geometry, fixture: FixtureType, index: u32) -> Option<Target> {
    if index > CALIBRATION_INDEX {
        return None;
    }
    if index == 0 {
        return Some(Target {
            index,
            long_travel: 0.0,
            engagement: 0.0,
            rotation: 0.0,
            vertical: 0.0,
            orientation: HeadOrientation::Upper,
            requires_flip: false,
        });
    }

    let long_travel = geometry.connectors(fixture)[index as usize];
    let odd = fixture.is_odd();
    let flipped = (index == LAST_CONNECTOR - 1 && odd) || (index == LAST_CONNECTOR && !odd);

    let (orientation, vertical) = if index == CALIBRATION_INDEX {
        (HeadOrientation::Upper, geometry.z_low_connectors)
    } else if index >= LAST_CONNECTOR - 1 {
        if flipped {
            (HeadOrientation::Lower, geometry.z_flipped())
        } else {
            (HeadOrientation::Upper, geometry.z_high_connectors)
        }
    } else {
        (HeadOrientation::Vertical, geometry.z_low_connectors)
    };
    let rotation = match orientation {
        HeadOrientation::Upper => geometry.r_steps_to_0,
        HeadOrientation::Vertical => geometry.r_steps_to_90,
        HeadOrientation::Lower => geometry.r_steps_to_180,
    };
    let engagement = if index == CALIBRATION_INDEX {
        geometry.calibration_withdrawal_depth()
    } else {
        geometry.withdrawal_depth()
    };

    Some(Target {
        index,
        long_travel,
        engagement,
        rotation,
        vertical,
        orientation,
        requires_flip: flipped,
    })
}
