// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Actuator Gateway
//!
//! Boundary toward the physical gate controller. Protocol: one
//! newline-terminated grant token out, one newline-terminated acknowledgment
//! line back within a bounded timeout. One attempt per grant, no retry.
//!
//! The link is optional for the whole process lifetime. [`open_gateway`]
//! decides once at startup between a [`SerialGateway`] and the [`NullGateway`]
//! used for demo mode, so call sites never check for hardware themselves.

use plategate_config::ActuatorConfig;
use plategate_hal::{SerialIO, StdTimeProvider, TimeProvider};
use plategate_structures::GatewayError;
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, info, trace};

const READ_CHUNK: usize = 64;

/// What the actuator answered to a grant signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgment {
    /// No hardware attached; nothing was sent
    Demo,
    /// Acknowledgment line from the device, trimmed
    Received(String),
}

/// Sends grant signals to the actuator
pub trait ActuatorGateway {
    /// Signal a grant and wait for the acknowledgment
    ///
    /// Errors are for logging only; a grant is never revoked because the
    /// actuator failed.
    fn signal_grant(&mut self) -> Result<Acknowledgment, GatewayError>;

    fn is_connected(&self) -> bool;

    /// Release the session. Called once at shutdown; must be idempotent.
    fn close(&mut self) {}
}

/// Gateway for running without hardware
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGateway;

impl ActuatorGateway for NullGateway {
    fn signal_grant(&mut self) -> Result<Acknowledgment, GatewayError> {
        debug!("[GATEWAY] Demo mode, grant not sent to any device");
        Ok(Acknowledgment::Demo)
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// Gateway over a serial link
pub struct SerialGateway<S: SerialIO, T: TimeProvider = StdTimeProvider> {
    link: Option<S>,
    /// Grant token including the trailing newline
    token: Vec<u8>,
    ack_timeout: Duration,
    time: T,
}

impl<S> SerialGateway<S, StdTimeProvider>
where
    S: SerialIO,
    S::Error: Display,
{
    pub fn new(link: S, grant_token: &str, ack_timeout: Duration) -> Self {
        Self::with_time_provider(link, grant_token, ack_timeout, StdTimeProvider::new())
    }
}

impl<S, T> SerialGateway<S, T>
where
    S: SerialIO,
    S::Error: Display,
    T: TimeProvider,
{
    pub fn with_time_provider(link: S, grant_token: &str, ack_timeout: Duration, time: T) -> Self {
        let mut token = grant_token.as_bytes().to_vec();
        token.push(b'\n');
        Self {
            link: Some(link),
            token,
            ack_timeout,
            time,
        }
    }

    /// Discard input that arrived since the last exchange, such as an
    /// acknowledgment that came in after its deadline
    fn drain_input(&mut self) -> Result<(), GatewayError> {
        let link = self.link.as_mut().ok_or(GatewayError::NotConnected)?;
        let mut chunk = [0u8; READ_CHUNK];
        let mut discarded = 0;
        while link.available().map_err(|e| GatewayError::Io(e.to_string()))? {
            let read = link
                .read(&mut chunk)
                .map_err(|e| GatewayError::Io(e.to_string()))?;
            if read == 0 {
                break;
            }
            discarded += read;
        }
        if discarded > 0 {
            debug!("[GATEWAY] Discarded {} stale bytes before grant", discarded);
        }
        Ok(())
    }

    fn read_ack_line(&mut self) -> Result<Vec<u8>, GatewayError> {
        let link = self.link.as_mut().ok_or(GatewayError::NotConnected)?;
        let deadline = self.time.now() + self.ack_timeout;
        let mut line = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let read = link
                .read(&mut chunk)
                .map_err(|e| GatewayError::Io(e.to_string()))?;
            if read > 0 {
                trace!("[GATEWAY] read {} bytes", read);
                let received = &chunk[..read];
                if let Some(end) = received.iter().position(|&b| b == b'\n') {
                    line.extend_from_slice(&received[..end]);
                    return Ok(line);
                }
                line.extend_from_slice(received);
            }
            if self.time.now() >= deadline {
                return Err(GatewayError::AckTimeout(self.ack_timeout));
            }
        }
    }
}

impl<S, T> ActuatorGateway for SerialGateway<S, T>
where
    S: SerialIO,
    S::Error: Display,
    T: TimeProvider,
{
    fn signal_grant(&mut self) -> Result<Acknowledgment, GatewayError> {
        self.drain_input()?;
        let link = self.link.as_mut().ok_or(GatewayError::NotConnected)?;
        link.write_all(&self.token)
            .map_err(|e| GatewayError::Io(e.to_string()))?;
        link.flush().map_err(|e| GatewayError::Io(e.to_string()))?;
        debug!("[GATEWAY] Grant token sent, waiting for acknowledgment");

        let line = self.read_ack_line()?;
        let text = String::from_utf8(line)
            .map_err(|e| GatewayError::InvalidAck(format!("{:?}", e.as_bytes())))?;
        let text = text.trim().to_string();
        info!("[GATEWAY] Actuator response: {}", text);
        Ok(Acknowledgment::Received(text))
    }

    fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    fn close(&mut self) {
        if self.link.take().is_some() {
            info!("[GATEWAY] Actuator session closed");
        }
    }
}

/// Establish the actuator session for this run
///
/// Falls back to [`NullGateway`] when the actuator is disabled, the port cannot
/// be opened, or serial support was not compiled in. Never fails.
pub fn open_gateway(config: &ActuatorConfig, time: &dyn TimeProvider) -> Box<dyn ActuatorGateway> {
    if !config.enabled {
        info!("[GATEWAY] Actuator disabled, running in demo mode");
        return Box::new(NullGateway);
    }
    open_serial_gateway(config, time)
}

#[cfg(feature = "serial")]
fn open_serial_gateway(config: &ActuatorConfig, time: &dyn TimeProvider) -> Box<dyn ActuatorGateway> {
    use plategate_hal::SerialPortLink;
    use tracing::error;

    // Short reads so the acknowledgment deadline is checked often
    let read_timeout = config.ack_timeout().min(Duration::from_millis(100));
    match SerialPortLink::open(&config.port, config.baud_rate, read_timeout) {
        Ok(link) => {
            time.sleep(config.settle_delay());
            info!("[GATEWAY] Connected to actuator on {}", config.port);
            Box::new(SerialGateway::new(
                link,
                &config.grant_token,
                config.ack_timeout(),
            ))
        }
        Err(e) => {
            error!("[GATEWAY] Could not open serial port {}: {}", config.port, e);
            info!("[GATEWAY] Running in demo mode without actuator connection");
            Box::new(NullGateway)
        }
    }
}

#[cfg(not(feature = "serial"))]
fn open_serial_gateway(config: &ActuatorConfig, _time: &dyn TimeProvider) -> Box<dyn ActuatorGateway> {
    tracing::warn!(
        "[GATEWAY] Built without serial support, ignoring {} and running in demo mode",
        config.port
    );
    Box::new(NullGateway)
}
