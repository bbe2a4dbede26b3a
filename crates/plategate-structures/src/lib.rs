// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The core crate for PlateGate. Defines the data structures passed between the
//! recognition fusion, matcher, scan scheduler and actuator gateway.
//!
//! ```
//! use plategate_structures::{normalize, Identifier};
//!
//! let id = Identifier::new(" abc 123 ");
//! assert_eq!(id.as_str(), "ABC123");
//! assert_eq!(normalize("abc 123"), "ABC123");
//! ```

mod decision;
mod error;
mod frame;
mod hypothesis;
mod identifier;

pub use decision::{Decision, InconclusiveReason, MatchKind};
pub use error::{CaptureError, GatewayError, RecognitionError};
pub use frame::Frame;
pub use hypothesis::Hypothesis;
pub use identifier::{normalize, Identifier};
