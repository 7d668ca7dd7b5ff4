//! Building a [`MotionCoordinator`] from configuration and a driver.
//!
//! Construction never fails on missing hardware: a board that does not come
//! up, a port without a motor or an unreadable limit input leaves the
//! affected axes absent and is listed in the [`AssemblyReport`].

use oduqc_common::motion::config::FixtureConfig;
use oduqc_common::motion::driver::{FixtureDriver, StepperBoard};
use oduqc_common::motion::types::AxisLabel;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::axis::{Axis, AxisParams, AxisSlot};
use crate::coordinator::MotionCoordinator;
use crate::interlock::Interlock;

/// An axis that could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbsentAxis {
    pub label: AxisLabel,
    pub reason: String,
}

/// What came up and what did not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub driver: String,
    pub driver_version: String,
    pub boards: Vec<String>,
    pub present: Vec<AxisLabel>,
    pub absent: Vec<AbsentAxis>,
}

impl AssemblyReport {
    /// Every axis of the fixture is present.
    pub fn is_complete(&self) -> bool {
        self.absent.is_empty()
    }
}

/// Open every board used by an axis, then acquire each axis's motor and
/// limit input.
pub fn assemble(
    config: &FixtureConfig,
    driver: &mut dyn FixtureDriver,
    interlock: Interlock,
) -> (MotionCoordinator, AssemblyReport) {
    info!(driver = driver.name(), version = driver.version(), "assembling fixture");

    let mut boards: Vec<Box<dyn StepperBoard>> = Vec::new();
    let mut board_errors: HashMap<&str, String> = HashMap::new();
    for board_config in &config.boards {
        let used = config.axes.iter().any(|a| a.board == board_config.name);
        if !used {
            continue;
        }
        match driver.open_board(board_config) {
            Ok(board) => boards.push(board),
            Err(e) => {
                error!(board = %board_config.name, "board unavailable: {e}");
                board_errors.insert(board_config.name.as_str(), e.to_string());
            }
        }
    }

    let mut slots = Vec::with_capacity(AxisLabel::ALL.len());
    for label in AxisLabel::ALL {
        let Some(axis_config) = config.axis(label) else {
            slots.push(AxisSlot::absent(label, "not configured"));
            continue;
        };
        if let Some(reason) = board_errors.get(axis_config.board.as_str()) {
            slots.push(AxisSlot::absent(
                label,
                format!("board '{}' unavailable: {reason}", axis_config.board),
            ));
            continue;
        }
        let Some(board) = boards.iter_mut().find(|b| b.name() == axis_config.board) else {
            slots.push(AxisSlot::absent(
                label,
                format!("board '{}' not declared", axis_config.board),
            ));
            continue;
        };
        let motor = match board.acquire_motor(
            axis_config.port,
            axis_config.steps_per_revolution,
            axis_config.rpm,
        ) {
            Ok(motor) => motor,
            Err(e) => {
                error!(axis = %label, board = %axis_config.board, port = axis_config.port, "motor acquisition failed: {e}");
                slots.push(AxisSlot::absent(label, e.to_string()));
                continue;
            }
        };
        let limit_switch = match driver.open_limit_switch(axis_config) {
            Ok(limit_switch) => limit_switch,
            Err(e) => {
                error!(axis = %label, pin = axis_config.limit_pin, "limit input unavailable: {e}");
                slots.push(AxisSlot::absent(label, e.to_string()));
                continue;
            }
        };
        let params = AxisParams::from_config(axis_config, &config.motion);
        slots.push(AxisSlot::Present(Axis::new(label, motor, limit_switch, params)));
    }

    let mut present = Vec::new();
    let mut absent = Vec::new();
    for slot in &slots {
        match slot {
            AxisSlot::Present(axis) => present.push(axis.label()),
            AxisSlot::Absent { label, reason } => {
                if reason != "not configured" {
                    warn!(axis = %label, %reason, "axis absent");
                }
                absent.push(AbsentAxis {
                    label: *label,
                    reason: reason.clone(),
                });
            }
        }
    }

    let report = AssemblyReport {
        driver: driver.name().to_string(),
        driver_version: driver.version().to_string(),
        boards: boards.iter().map(|b| b.name().to_string()).collect(),
        present,
        absent,
    };
    let coordinator = MotionCoordinator::new(
        slots,
        boards,
        config.geometry.clone(),
        Duration::from_millis(config.motion.settle_ms),
        interlock,
    );
    info!(
        present = report.present.len(),
        absent = report.absent.len(),
        "fixture assembled"
    );
    (coordinator, report)
}
