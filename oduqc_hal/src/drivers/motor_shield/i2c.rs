//! Linux `/dev/i2c-N` register access.

use oduqc_common::motion::driver::DriverError;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::Path;

nix::ioctl_write_int_bad!(
    /// Select the slave address of an I2C descriptor (`I2C_SLAVE` from `<linux/i2c-dev.h>`).
    i2c_set_slave,
    0x0703
);

/// Byte-register access to one bus device.
pub trait RegisterBus: Send {
    /// Write one register.
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), DriverError>;

    /// Read one register.
    fn read_register(&mut self, register: u8) -> Result<u8, DriverError>;

    /// Write consecutive registers starting at `register` (auto-increment).
    fn write_block(&mut self, register: u8, data: &[u8]) -> Result<(), DriverError>;
}

/// One slave address on a Linux I2C character device.
#[derive(Debug)]
pub struct I2cDevice {
    file: File,
    address: u16,
}

impl I2cDevice {
    /// Open `bus` and bind the descriptor to the 7-bit `address`.
    pub fn open(bus: &Path, address: u16) -> Result<Self, DriverError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(bus)
            .map_err(|e| DriverError::Bus(format!("{}: {e}", bus.display())))?;
        // SAFETY: the descriptor is owned by `file` and stays open for the call.
        unsafe { i2c_set_slave(file.as_raw_fd(), libc::c_int::from(address)) }.map_err(|e| {
            DriverError::Bus(format!(
                "{}: cannot select address 0x{address:02X}: {e}",
                bus.display()
            ))
        })?;
        Ok(Self { file, address })
    }

    /// Bound slave address.
    pub fn address(&self) -> u16 {
        self.address
    }

    fn io_error(&self, e: std::io::Error) -> DriverError {
        DriverError::Bus(format!("address 0x{:02X}: {e}", self.address))
    }
}

impl RegisterBus for I2cDevice {
    fn write_register(&mut self, register: u8, value: u8) -> Result<(), DriverError> {
        self.file
            .write_all(&[register, value])
            .map_err(|e| self.io_error(e))
    }

    fn read_register(&mut self, register: u8) -> Result<u8, DriverError> {
        self.file.write_all(&[register]).map_err(|e| self.io_error(e))?;
        let mut value = [0u8; 1];
        self.file
            .read_exact(&mut value)
            .map_err(|e| self.io_error(e))?;
        Ok(value[0])
    }

    fn write_block(&mut self, register: u8, data: &[u8]) -> Result<(), DriverError> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(register);
        frame.extend_from_slice(data);
        self.file.write_all(&frame).map_err(|e| self.io_error(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bus_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = I2cDevice::open(&dir.path().join("i2c-9"), 0x60).unwrap_err();
        assert!(matches!(err, DriverError::Bus(ref msg) if msg.contains("i2c-9")), "{err}");
    }

    #[test]
    fn address_select_fails_on_plain_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = I2cDevice::open(file.path(), 0x60).unwrap_err();
        assert!(
            matches!(err, DriverError::Bus(ref msg) if msg.contains("0x60")),
            "{err}"
        );
    }
}
