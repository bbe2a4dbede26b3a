// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Serial I/O abstraction for the actuator link
pub trait SerialIO {
    /// Platform-specific error type
    type Error;

    /// Write bytes to serial port
    ///
    /// # Arguments
    /// * `data` - Bytes to write
    ///
    /// # Returns
    /// Number of bytes written or error
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Read bytes from serial port
    ///
    /// Blocks for at most the link's own read timeout. Returning `Ok(0)` means
    /// nothing arrived in that window; it is not end-of-stream.
    ///
    /// # Arguments
    /// * `buffer` - Buffer to read into
    ///
    /// # Returns
    /// Number of bytes read or error
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error>;

    /// Flush output buffer
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Write the whole buffer, looping over short writes
    fn write_all(&mut self, mut data: &[u8]) -> Result<(), Self::Error> {
        while !data.is_empty() {
            let written = self.write(data)?;
            if written == 0 {
                // Link accepted nothing; let the caller's flush/timeout surface it
                break;
            }
            data = &data[written..];
        }
        Ok(())
    }

    /// Check if data is available to read
    fn available(&self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}
