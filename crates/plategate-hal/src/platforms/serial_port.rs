// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Host serial port (USB-UART bridge to the actuator board)

use crate::hal::SerialIO;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, info};

/// Serial link opened through the `serialport` crate
pub struct SerialPortLink {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SerialPortLink {
    /// Open a port (8N1, no flow control)
    ///
    /// # Arguments
    /// * `path` - Device path, e.g. `/dev/ttyUSB0` or `COM3`
    /// * `baud_rate` - Baud rate, typically 115200
    /// * `read_timeout` - Upper bound for a single `read` call
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, serialport::Error> {
        debug!("[SERIAL] Opening {} at {} baud", path, baud_rate);
        let port = serialport::new(path, baud_rate)
            .timeout(read_timeout)
            .open()?;
        info!("[SERIAL] Opened {}", path);
        Ok(Self {
            port,
            name: path.to_string(),
        })
    }
}

impl SerialIO for SerialPortLink {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.port.write(data)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.port.flush()
    }

    fn available(&self) -> Result<bool, Self::Error> {
        let pending = self
            .port
            .bytes_to_read()
            .map_err(std::io::Error::from)?;
        Ok(pending > 0)
    }
}

impl Drop for SerialPortLink {
    fn drop(&mut self) {
        debug!("[SERIAL] Closing {}", self.name);
    }
}
