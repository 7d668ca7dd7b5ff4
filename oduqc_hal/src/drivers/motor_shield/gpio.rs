//! Limit switch inputs through the sysfs GPIO interface.

use oduqc_common::motion::driver::{DriverError, LimitSwitch};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One GPIO line read from `<root>/gpio<N>/value`; active while it reads `1`.
#[derive(Debug)]
pub struct SysfsLimitSwitch {
    pin: u32,
    value_path: PathBuf,
}

impl SysfsLimitSwitch {
    /// Export the line if needed and configure it as an input.
    pub fn open(root: &Path, pin: u32) -> Result<Self, DriverError> {
        let line = root.join(format!("gpio{pin}"));
        if !line.exists() {
            fs::write(root.join("export"), pin.to_string())
                .map_err(|e| DriverError::Gpio(format!("export gpio{pin}: {e}")))?;
            debug!(pin, "GPIO line exported");
        }
        let direction = line.join("direction");
        if direction.exists() {
            fs::write(&direction, "in")
                .map_err(|e| DriverError::Gpio(format!("gpio{pin} direction: {e}")))?;
        }
        let value_path = line.join("value");
        if !value_path.exists() {
            return Err(DriverError::Gpio(format!(
                "{} does not exist",
                value_path.display()
            )));
        }
        Ok(Self { pin, value_path })
    }

    /// GPIO line number.
    pub fn pin(&self) -> u32 {
        self.pin
    }
}

impl LimitSwitch for SysfsLimitSwitch {
    fn is_active(&mut self) -> Result<bool, DriverError> {
        let value = fs::read_to_string(&self.value_path)
            .map_err(|e| DriverError::Gpio(format!("read gpio{}: {e}", self.pin)))?;
        Ok(value.trim() == "1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_line(root: &Path, pin: u32, value: &str) -> PathBuf {
        let line = root.join(format!("gpio{pin}"));
        fs::create_dir_all(&line).unwrap();
        fs::write(line.join("direction"), "out").unwrap();
        fs::write(line.join("value"), value).unwrap();
        line
    }

    #[test]
    fn reads_active_level_and_sets_input() {
        let tmp = TempDir::new().unwrap();
        let line = fake_line(tmp.path(), 5, "0\n");
        let mut switch = SysfsLimitSwitch::open(tmp.path(), 5).unwrap();
        assert_eq!(fs::read_to_string(line.join("direction")).unwrap(), "in");
        assert!(!switch.is_active().unwrap());

        fs::write(line.join("value"), "1\n").unwrap();
        assert!(switch.is_active().unwrap());
    }

    #[test]
    fn missing_line_after_export_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = SysfsLimitSwitch::open(tmp.path(), 7).unwrap_err();
        assert!(matches!(err, DriverError::Gpio(_)));
        assert_eq!(fs::read_to_string(tmp.path().join("export")).unwrap(), "7");
    }

    #[test]
    fn vanished_value_file_is_a_read_error() {
        let tmp = TempDir::new().unwrap();
        let line = fake_line(tmp.path(), 4, "0");
        let mut switch = SysfsLimitSwitch::open(tmp.path(), 4).unwrap();
        fs::remove_file(line.join("value")).unwrap();
        assert!(switch.is_active().is_err());
    }
}
