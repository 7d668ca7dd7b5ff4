//! Axis-level value types shared by drivers and the motion core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a character or string does not name an axis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown axis label '{0}' (expected X, Y, Z or R)")]
pub struct UnknownAxisLabel(pub String);

/// Single-character identity of a fixture axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AxisLabel {
    /// Engagement axis: plugs the head into the device under test.
    X,
    /// Long-travel axis: runs along the connector row.
    Y,
    /// Vertical axis.
    Z,
    /// Rotation axis.
    R,
}

impl AxisLabel {
    /// All labels in report order.
    pub const ALL: [AxisLabel; 4] = [Self::X, Self::Y, Self::Z, Self::R];

    /// Case-insensitive lookup from a command character.
    pub const fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'X' => Some(Self::X),
            'Y' => Some(Self::Y),
            'Z' => Some(Self::Z),
            'R' => Some(Self::R),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_char(&self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
            Self::R => 'R',
        }
    }

    /// Slot index used by fixed-size per-axis arrays.
    #[inline]
    pub const fn index(&self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::R => 3,
        }
    }
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for AxisLabel {
    type Err = UnknownAxisLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c).ok_or_else(|| UnknownAxisLabel(s.to_string())),
            _ => Err(UnknownAxisLabel(s.to_string())),
        }
    }
}

/// Last commanded direction of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Away from the limit switch (position grows).
    Forward,
    /// Toward the limit switch (position shrinks).
    Backward,
    /// No motion commanded yet.
    #[default]
    Unset,
}

impl Direction {
    /// Direction of a signed distance; zero maps to `Unset`.
    pub fn of(distance: f64) -> Self {
        if distance > 0.0 {
            Self::Forward
        } else if distance < 0.0 {
            Self::Backward
        } else {
            Self::Unset
        }
    }

    /// Sign applied to tracked position updates.
    #[inline]
    pub const fn sign(&self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Backward => -1.0,
            Self::Unset => 0.0,
        }
    }

    #[inline]
    pub const fn reversed(&self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
            Self::Unset => Self::Unset,
        }
    }
}

/// Coil drive style for one stepping call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StepStyle {
    /// One coil energised per step.
    Single,
    /// Two coils energised per step (full torque).
    #[default]
    Double,
    /// Alternating single/double half steps.
    Interleave,
    /// Sinusoidal microstepping; `count` is in microsteps.
    Microstep,
}

/// Which of the two mirrored connector tables applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum FixtureType {
    /// Odd fixture variants (1, 3, ...).
    #[default]
    Odd = 1,
    /// Even fixture variants (2, 4, ...).
    Even = 2,
}

impl FixtureType {
    /// Any odd raw value resolves to `Odd`, everything else to `Even`.
    pub const fn from_raw(raw: i64) -> Self {
        if raw.rem_euclid(2) == 1 {
            Self::Odd
        } else {
            Self::Even
        }
    }

    /// Row of the connector table.
    #[inline]
    pub const fn table_row(&self) -> usize {
        match self {
            Self::Odd => 0,
            Self::Even => 1,
        }
    }

    #[inline]
    pub const fn is_odd(&self) -> bool {
        matches!(self, Self::Odd)
    }
}

impl fmt::Display for FixtureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Odd => write!(f, "odd"),
            Self::Even => write!(f, "even"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_label_from_char_is_case_insensitive() {
        assert_eq!(AxisLabel::from_char('x'), Some(AxisLabel::X));
        assert_eq!(AxisLabel::from_char('R'), Some(AxisLabel::R));
        assert_eq!(AxisLabel::from_char('q'), None);
    }

    #[test]
    fn axis_label_parse() {
        assert_eq!("z".parse::<AxisLabel>().unwrap(), AxisLabel::Z);
        assert!("XY".parse::<AxisLabel>().is_err());
        assert!("".parse::<AxisLabel>().is_err());
    }

    #[test]
    fn axis_label_indices_are_unique() {
        let mut seen = [false; 4];
        for label in AxisLabel::ALL {
            assert!(!seen[label.index()]);
            seen[label.index()] = true;
        }
    }

    #[test]
    fn direction_of_distance() {
        assert_eq!(Direction::of(3.5), Direction::Forward);
        assert_eq!(Direction::of(-0.25), Direction::Backward);
        assert_eq!(Direction::of(0.0), Direction::Unset);
        assert_eq!(Direction::Forward.reversed(), Direction::Backward);
        assert_eq!(Direction::Unset.sign(), 0.0);
    }

    #[test]
    fn fixture_type_resolution() {
        assert_eq!(FixtureType::from_raw(1), FixtureType::Odd);
        assert_eq!(FixtureType::from_raw(3), FixtureType::Odd);
        assert_eq!(FixtureType::from_raw(4), FixtureType::Even);
        assert_eq!(FixtureType::from_raw(0), FixtureType::Even);
        assert_eq!(FixtureType::from_raw(-3), FixtureType::Odd);
        assert_eq!(FixtureType::Even as u8, 2);
    }
}
