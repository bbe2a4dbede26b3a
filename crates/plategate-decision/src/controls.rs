// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Operator input polled once per loop iteration

/// Command issued by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Stop after the current iteration
    Quit,
    /// Scan now, unless in cooldown
    ManualScan,
}

impl OperatorCommand {
    /// Key binding used by interactive front ends: `q` quits, `s` scans
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'q' => Some(OperatorCommand::Quit),
            's' => Some(OperatorCommand::ManualScan),
            _ => None,
        }
    }
}

pub trait OperatorControls {
    /// Non-blocking; `None` when nothing was pressed
    fn poll(&mut self) -> Option<OperatorCommand>;
}

/// Headless operation: no operator, never any command
#[derive(Debug, Clone, Copy, Default)]
pub struct NoControls;

impl OperatorControls for NoControls {
    fn poll(&mut self) -> Option<OperatorCommand> {
        None
    }
}
