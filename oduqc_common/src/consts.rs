//! Production fixture constants.
//!
//! All distances are in tracked-position units: one unit is one full motor
//! step, the fractional part is executed as microsteps. These values are the
//! serde defaults of [`crate::motion::config::FixtureConfig`], so a fixture
//! without a config file runs with them.

use static_assertions::const_assert;

// ─── Topology ───────────────────────────────────────────────────────

/// Maximum number of axes on one fixture (X, Y, Z, R).
pub const MAX_AXES: usize = 4;

/// Stepper ports per driver board.
pub const PORTS_PER_BOARD: u8 = 2;

/// Entries per connector table (index 0 = home, 1..=18 connectors, 19 calibration).
pub const CONNECTOR_SLOTS: usize = 20;

/// Highest physical connector index.
pub const LAST_CONNECTOR: u32 = 18;

/// Reserved calibration position index.
pub const CALIBRATION_INDEX: u32 = 19;

/// I2C address of the board carrying the long-travel and vertical axes.
pub const PRIMARY_BOARD_ADDRESS: u16 = 0x60;

/// I2C address of the board carrying the engagement and rotation axes.
pub const SECONDARY_BOARD_ADDRESS: u16 = 0x61;

/// Default Linux I2C bus device.
pub const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";

/// Default sysfs GPIO root used for limit switch inputs.
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// PWM frequency programmed into the shield's PWM controller [Hz].
pub const DEFAULT_PWM_FREQUENCY_HZ: f32 = 1600.0;

// ─── Stepping ───────────────────────────────────────────────────────

/// Forward over-travel used to take up backlash [units].
pub const DEFAULT_OVERSHOOT: f64 = 25.0;

/// Whole steps executed between two stop polls.
pub const DEFAULT_STEP_SIZE: u32 = 1;

/// Microsteps per full step on the stepper shield.
pub const DEFAULT_MICROSTEPS_PER_STEP: u32 = 16;

/// Settle delay after engaging or withdrawing [ms].
pub const DEFAULT_SETTLE_MS: u64 = 50;

/// Upper bound on microsteps taken while backing off a limit switch.
pub const DEFAULT_MAX_CLEAR_MICROSTEPS: u32 = 400 * DEFAULT_MICROSTEPS_PER_STEP;

/// Rotation axis steps per degree (2048 steps per revolution).
pub const STEPS_PER_DEGREE: f64 = 2048.0 / 360.0;

// ─── Per-axis defaults ──────────────────────────────────────────────

/// Engagement axis software travel limit.
pub const X_LIMIT: u32 = 2000;
/// Long-travel axis software travel limit.
pub const Y_LIMIT: u32 = 3225;
/// Vertical axis software travel limit.
pub const Z_LIMIT: u32 = 1635;
/// Rotation axis software travel limit (a little over 200 degrees).
pub const R_LIMIT: u32 = 1200;

/// 28BYJ-48 geared steppers (engagement and rotation axes).
pub const GEARED_STEPS_PER_REVOLUTION: u16 = 2048;
/// NEMA-17 steppers (long-travel and vertical axes).
pub const NEMA17_STEPS_PER_REVOLUTION: u16 = 200;

// ─── Geometry ───────────────────────────────────────────────────────

/// Engagement depth: parked head to the face of the device under test.
pub const ENGAGE_DEPTH: f64 = 950.0;

/// Distance the head stays short of the device while travelling.
pub const PLUG_CLEARANCE: f64 = 500.0;

/// Engagement depth used against the calibration light guide.
pub const CALIBRATION_DEPTH: f64 = 1950.0;

/// Vertical travel to the connectors 1..=16 (head vertical).
pub const Z_LOW_CONNECTORS: f64 = 469.0;

/// Vertical travel to connectors 17/18 with the head in the upper horizontal orientation.
pub const Z_HIGH_CONNECTORS: f64 = 679.0;

/// Extra vertical travel needed when the head is turned to 180 degrees.
pub const Z_ROTATION_OFFSET: f64 = 931.0;

/// Rotation axis steps to the upper horizontal orientation.
pub const R_STEPS_TO_0: f64 = 63.0;
/// Rotation axis steps to the vertical orientation.
pub const R_STEPS_TO_90: f64 = 581.0;
/// Rotation axis steps to the lower horizontal orientation.
pub const R_STEPS_TO_180: f64 = 1107.0;

/// Long-travel targets per connector for odd (row 0) and even (row 1) fixtures.
///
/// Index 0 is home, 19 is the calibration position.
pub const CONNECTOR_TABLE: [[f64; CONNECTOR_SLOTS]; 2] = [
    [
        0.0, 46.0, 194.0, 339.0, 570.0, 720.0, 870.0, 1020.0, 1170.0, 1320.0, 1470.0, 1620.0,
        1770.0, 1920.0, 2070.0, 2220.0, 2370.0, 136.0, 1236.0, 750.0,
    ],
    [
        0.0, 2370.0, 2225.0, 2080.0, 1935.0, 1790.0, 1645.0, 1500.0, 1355.0, 1210.0, 1065.0,
        920.0, 775.0, 630.0, 485.0, 340.0, 155.0, 1755.0, 565.0, 750.0,
    ],
];

const_assert!(CALIBRATION_INDEX as usize == CONNECTOR_SLOTS - 1);
const_assert!(LAST_CONNECTOR < CALIBRATION_INDEX);
const_assert!(DEFAULT_MICROSTEPS_PER_STEP.is_power_of_two());
const_assert!(CALIBRATION_DEPTH > ENGAGE_DEPTH);
const_assert!(ENGAGE_DEPTH > PLUG_CLEARANCE);
const_assert!((Z_HIGH_CONNECTORS + Z_ROTATION_OFFSET) as u32 <= Z_LIMIT);
const_assert!((R_STEPS_TO_180 as u32) < R_LIMIT);
