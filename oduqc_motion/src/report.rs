//! Position report returned to the dispatch layer.

use heapless::Vec as HVec;
use oduqc_common::consts::MAX_AXES;
use oduqc_common::motion::types::{AxisLabel, FixtureType};
use serde::Serialize;
use std::fmt;

use crate::axis::{Axis, AxisState};

/// One axis line of a [`PositionReport`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisReading {
    pub label: AxisLabel,
    /// `None` when the axis is absent.
    pub position: Option<f64>,
    pub at_home: bool,
    pub state: Option<AxisState>,
}

impl AxisReading {
    pub fn present(axis: &Axis) -> Self {
        Self {
            label: axis.label(),
            position: Some(axis.position()),
            at_home: axis.is_home(),
            state: Some(axis.state()),
        }
    }

    pub fn absent(label: AxisLabel) -> Self {
        Self {
            label,
            position: None,
            at_home: false,
            state: None,
        }
    }
}

/// Tracked head position, one reading per axis in X, Y, Z, R order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    pub fixture_type: FixtureType,
    pub plugged_in: bool,
    pub axes: HVec<AxisReading, MAX_AXES>,
}

impl PositionReport {
    pub fn new(fixture_type: FixtureType, plugged_in: bool) -> Self {
        Self {
            fixture_type,
            plugged_in,
            axes: HVec::new(),
        }
    }

    /// Add a reading, replacing any earlier one for the same axis.
    pub fn push(&mut self, reading: AxisReading) {
        if let Some(existing) = self.axes.iter_mut().find(|r| r.label == reading.label) {
            *existing = reading;
            return;
        }
        // at most one reading per label, and there are MAX_AXES labels
        let pushed = self.axes.push(reading);
        debug_assert!(pushed.is_ok(), "more axis labels than report slots");
    }

    pub fn get(&self, label: AxisLabel) -> Option<&AxisReading> {
        self.axes.iter().find(|r| r.label == label)
    }

    pub fn position(&self, label: AxisLabel) -> Option<f64> {
        self.get(label).and_then(|r| r.position)
    }
}

impl fmt::Display for PositionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connector head at (")?;
        for (i, label) in AxisLabel::ALL.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match self.position(*label) {
                Some(position) => write!(f, "{position:.2}")?,
                None => write!(f, "-")?,
            }
        }
        write!(f, ")")
    }
}
