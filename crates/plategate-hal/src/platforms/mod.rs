// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

mod manual_clock;
#[cfg(feature = "serial")]
mod serial_port;
mod std_clock;

pub use manual_clock::ManualTimeProvider;
#[cfg(feature = "serial")]
pub use serial_port::SerialPortLink;
pub use std_clock::StdTimeProvider;
