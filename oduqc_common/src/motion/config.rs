//! Fixture configuration loaded from `fixture.toml`.
//!
//! - `FixtureConfig` - Root document
//! - `MotionSettings` - Stepping parameters shared by all axes
//! - `BoardConfig` - One I2C stepper driver board
//! - `AxisConfig` - One axis: board binding, limit input, travel limit, speed
//!
//! Every field defaults to the production fixture, so an empty file (or
//! `FixtureConfig::default()`) describes the real four-axis machine.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! service_name = "oduqc-bench-02"
//!
//! [motion]
//! overshoot = 25.0
//! overshoot_exempt = ["X"]
//!
//! [[boards]]
//! name = "shield-lower"
//! address = 0x60
//!
//! [[axes]]
//! label = "Y"
//! board = "shield-lower"
//! port = 1
//! limit_pin = 5
//! limit = 3225
//! rpm = 25
//! steps_per_revolution = 200
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    DEFAULT_GPIO_ROOT, DEFAULT_I2C_BUS, DEFAULT_MAX_CLEAR_MICROSTEPS,
    DEFAULT_MICROSTEPS_PER_STEP, DEFAULT_OVERSHOOT, DEFAULT_PWM_FREQUENCY_HZ, DEFAULT_SETTLE_MS,
    DEFAULT_STEP_SIZE, GEARED_STEPS_PER_REVOLUTION, MAX_AXES, NEMA17_STEPS_PER_REVOLUTION,
    PORTS_PER_BOARD, PRIMARY_BOARD_ADDRESS, R_LIMIT, SECONDARY_BOARD_ADDRESS, X_LIMIT, Y_LIMIT,
    Z_LIMIT,
};
use crate::motion::geometry::Geometry;
use crate::motion::types::AxisLabel;

/// Name of the default board carrying Y and Z.
pub const PRIMARY_BOARD: &str = "shield-lower";
/// Name of the default board carrying X and R.
pub const SECONDARY_BOARD: &str = "shield-upper";

fn default_overshoot() -> f64 {
    DEFAULT_OVERSHOOT
}
fn default_overshoot_exempt() -> Vec<AxisLabel> {
    vec![AxisLabel::X]
}
fn default_step_size() -> u32 {
    DEFAULT_STEP_SIZE
}
fn default_microsteps() -> u32 {
    DEFAULT_MICROSTEPS_PER_STEP
}
fn default_settle_ms() -> u64 {
    DEFAULT_SETTLE_MS
}
fn default_max_clear_microsteps() -> u32 {
    DEFAULT_MAX_CLEAR_MICROSTEPS
}
fn default_bus() -> PathBuf {
    PathBuf::from(DEFAULT_I2C_BUS)
}
fn default_pwm_frequency() -> f32 {
    DEFAULT_PWM_FREQUENCY_HZ
}
fn default_gpio_root() -> PathBuf {
    PathBuf::from(DEFAULT_GPIO_ROOT)
}
fn default_boards() -> Vec<BoardConfig> {
    BoardConfig::production()
}
fn default_axes() -> Vec<AxisConfig> {
    AxisConfig::production()
}

/// Stepping parameters shared by every axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSettings {
    /// Forward over-travel taken and retracted to cancel backlash [units].
    #[serde(default = "default_overshoot")]
    pub overshoot: f64,
    /// Axes that never overshoot (the engagement axis must not push past its depth).
    #[serde(default = "default_overshoot_exempt")]
    pub overshoot_exempt: Vec<AxisLabel>,
    /// Whole steps per increment between two stop polls.
    #[serde(default = "default_step_size")]
    pub step_size: u32,
    /// Microsteps per full step; a power of two so tracked positions stay exact.
    #[serde(default = "default_microsteps")]
    pub microsteps_per_step: u32,
    /// Settle delay after engaging or withdrawing [ms].
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Give up backing off a limit switch after this many microsteps.
    #[serde(default = "default_max_clear_microsteps")]
    pub max_clear_microsteps: u32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            overshoot: DEFAULT_OVERSHOOT,
            overshoot_exempt: default_overshoot_exempt(),
            step_size: DEFAULT_STEP_SIZE,
            microsteps_per_step: DEFAULT_MICROSTEPS_PER_STEP,
            settle_ms: DEFAULT_SETTLE_MS,
            max_clear_microsteps: DEFAULT_MAX_CLEAR_MICROSTEPS,
        }
    }
}

impl MotionSettings {
    /// Overshoot applied to forward moves of `label`.
    pub fn overshoot_for(&self, label: AxisLabel) -> f64 {
        if self.overshoot_exempt.contains(&label) {
            0.0
        } else {
            self.overshoot
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.overshoot.is_finite() || self.overshoot < 0.0 {
            return Err("motion.overshoot must be a finite, non-negative value".to_string());
        }
        if self.overshoot.fract() != 0.0 {
            return Err("motion.overshoot must be a whole number of steps".to_string());
        }
        if self.step_size == 0 {
            return Err("motion.step_size must be at least 1".to_string());
        }
        if !self.microsteps_per_step.is_power_of_two() || self.microsteps_per_step > 256 {
            return Err(format!(
                "motion.microsteps_per_step must be a power of two <= 256 (got {})",
                self.microsteps_per_step
            ));
        }
        if self.max_clear_microsteps == 0 {
            return Err("motion.max_clear_microsteps must be at least 1".to_string());
        }
        Ok(())
    }
}

/// One I2C-attached stepper driver board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Name referenced by `AxisConfig::board`.
    pub name: String,
    /// I2C bus device.
    #[serde(default = "default_bus")]
    pub bus: PathBuf,
    /// 7-bit I2C address of the board's PWM controller.
    pub address: u16,
    /// PWM frequency [Hz].
    #[serde(default = "default_pwm_frequency")]
    pub pwm_frequency: f32,
}

impl BoardConfig {
    /// The two shields of the production fixture.
    pub fn production() -> Vec<Self> {
        vec![
            Self {
                name: PRIMARY_BOARD.to_string(),
                bus: default_bus(),
                address: PRIMARY_BOARD_ADDRESS,
                pwm_frequency: DEFAULT_PWM_FREQUENCY_HZ,
            },
            Self {
                name: SECONDARY_BOARD.to_string(),
                bus: default_bus(),
                address: SECONDARY_BOARD_ADDRESS,
                pwm_frequency: DEFAULT_PWM_FREQUENCY_HZ,
            },
        ]
    }
}

/// One axis: where its motor is, where its limit switch is, how far it may go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub label: AxisLabel,
    /// Board name (see `BoardConfig::name`).
    pub board: String,
    /// Stepper port on the board (1-based).
    pub port: u8,
    /// GPIO line of the limit switch.
    pub limit_pin: u32,
    /// Software travel limit [units].
    pub limit: u32,
    /// Rotational speed [rpm].
    pub rpm: u16,
    /// Full steps per motor revolution.
    pub steps_per_revolution: u16,
}

impl AxisConfig {
    /// The four axes of the production fixture.
    pub fn production() -> Vec<Self> {
        let axis = |label, board: &str, port, limit_pin, limit, rpm, steps_per_revolution| Self {
            label,
            board: board.to_string(),
            port,
            limit_pin,
            limit,
            rpm,
            steps_per_revolution,
        };
        vec![
            axis(AxisLabel::X, SECONDARY_BOARD, 1, 4, X_LIMIT, 10, GEARED_STEPS_PER_REVOLUTION),
            axis(AxisLabel::Y, PRIMARY_BOARD, 1, 5, Y_LIMIT, 25, NEMA17_STEPS_PER_REVOLUTION),
            axis(AxisLabel::Z, PRIMARY_BOARD, 2, 6, Z_LIMIT, 25, NEMA17_STEPS_PER_REVOLUTION),
            axis(AxisLabel::R, SECONDARY_BOARD, 2, 7, R_LIMIT, 10, GEARED_STEPS_PER_REVOLUTION),
        ]
    }
}

/// Root of `fixture.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub motion: MotionSettings,
    #[serde(default)]
    pub geometry: Geometry,
    /// Sysfs GPIO root for limit switch inputs.
    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,
    #[serde(default = "default_boards")]
    pub boards: Vec<BoardConfig>,
    #[serde(default = "default_axes")]
    pub axes: Vec<AxisConfig>,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            motion: MotionSettings::default(),
            geometry: Geometry::default(),
            gpio_root: default_gpio_root(),
            boards: BoardConfig::production(),
            axes: AxisConfig::production(),
        }
    }
}

impl FixtureConfig {
    /// Axis configuration by label.
    pub fn axis(&self, label: AxisLabel) -> Option<&AxisConfig> {
        self.axes.iter().find(|a| a.label == label)
    }

    /// Board configuration by name.
    pub fn board(&self, name: &str) -> Option<&BoardConfig> {
        self.boards.iter().find(|b| b.name == name)
    }

    /// Validate the fixture configuration.
    ///
    /// # Validation Rules
    /// 1. `shared`, `motion` and `geometry` sections are individually valid
    /// 2. At most `MAX_AXES` axes, each label at most once
    /// 3. Board names unique; every axis names a declared board
    /// 4. Ports within `1..=PORTS_PER_BOARD`, no (board, port) bound twice
    /// 5. Non-zero limit, rpm and steps per revolution
    /// 6. Vertical and rotation targets reachable within the Z and R limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.motion
            .validate()
            .map_err(ConfigError::ValidationError)?;
        self.geometry
            .validate()
            .map_err(ConfigError::ValidationError)?;

        if self.axes.len() > MAX_AXES {
            return Err(ConfigError::ValidationError(format!(
                "Too many axes: {} (max {})",
                self.axes.len(),
                MAX_AXES
            )));
        }

        let mut board_names = HashSet::new();
        for board in &self.boards {
            if !board_names.insert(board.name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate board name '{}'",
                    board.name
                )));
            }
            if board.address > 0x7F {
                return Err(ConfigError::ValidationError(format!(
                    "board '{}': address 0x{:X} is not a 7-bit I2C address",
                    board.name, board.address
                )));
            }
            if !(board.pwm_frequency.is_finite() && board.pwm_frequency > 0.0) {
                return Err(ConfigError::ValidationError(format!(
                    "board '{}': pwm_frequency must be positive",
                    board.name
                )));
            }
        }

        let mut labels = HashSet::new();
        let mut bindings = HashSet::new();
        for axis in &self.axes {
            if !labels.insert(axis.label) {
                return Err(ConfigError::ValidationError(format!(
                    "axis {} declared twice",
                    axis.label
                )));
            }
            if !board_names.contains(axis.board.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "axis {}: unknown board '{}'",
                    axis.label, axis.board
                )));
            }
            if axis.port == 0 || axis.port > PORTS_PER_BOARD {
                return Err(ConfigError::ValidationError(format!(
                    "axis {}: port {} out of range 1..={}",
                    axis.label, axis.port, PORTS_PER_BOARD
                )));
            }
            if !bindings.insert((axis.board.as_str(), axis.port)) {
                return Err(ConfigError::ValidationError(format!(
                    "axis {}: port {} on '{}' already bound",
                    axis.label, axis.port, axis.board
                )));
            }
            if axis.limit == 0 || axis.rpm == 0 || axis.steps_per_revolution == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "axis {}: limit, rpm and steps_per_revolution must be non-zero",
                    axis.label
                )));
            }
        }

        if let Some(z) = self.axis(AxisLabel::Z) {
            let highest = self.geometry.z_flipped().max(self.geometry.z_low_connectors);
            if highest > f64::from(z.limit) {
                return Err(ConfigError::ValidationError(format!(
                    "vertical target {highest} exceeds Z limit {}",
                    z.limit
                )));
            }
        }
        if let Some(r) = self.axis(AxisLabel::R) {
            if self.geometry.r_steps_to_180 > f64::from(r.limit) {
                return Err(ConfigError::ValidationError(format!(
                    "rotation target {} exceeds R limit {}",
                    self.geometry.r_steps_to_180, r.limit
                )));
            }
        }
        if let Some(x) = self.axis(AxisLabel::X) {
            if self.geometry.calibration_depth > f64::from(x.limit) {
                return Err(ConfigError::ValidationError(format!(
                    "calibration depth {} exceeds X limit {}",
                    self.geometry.calibration_depth, x.limit
                )));
            }
        }

        Ok(())
    }
}
