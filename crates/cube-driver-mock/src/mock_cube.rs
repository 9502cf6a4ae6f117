//! Simulated Yeelight Cube.
//!
//! Records every successful command with a timestamp taken from the tokio
//! clock, so tests running with a paused clock see exact frame times.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use cube_core::matrix::WIRE_LEN;
use cube_core::{DeviceLink, Matrix};
use tokio::time::Instant;

use crate::errors::{ErrorConfig, OP_DIRECT_MODE, OP_SEND_FRAME, OP_SET_POWER};

/// A command the mock lamp accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LampEvent {
    /// `set_power(true)`
    PowerOn,
    /// `set_power(false)`
    PowerOff,
    /// `enter_direct_mode()`
    DirectMode,
    /// `send_frame` with its wire text
    Frame(String),
}

/// A [`LampEvent`] with the time it arrived, relative to lamp creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Time since the lamp was created.
    pub at: Duration,
    /// What was accepted.
    pub event: LampEvent,
}

#[derive(Debug, Default)]
struct LampState {
    powered: bool,
    direct_mode: bool,
    log: Vec<RecordedEvent>,
}

/// In-memory lamp implementing [`DeviceLink`].
///
/// # Example
///
/// ```rust,ignore
/// let lamp = MockCube::new().with_latency(Duration::from_millis(5));
/// lamp.set_power(true).await?;
/// assert!(lamp.is_on());
/// ```
#[derive(Debug)]
pub struct MockCube {
    state: Mutex<LampState>,
    errors: ErrorConfig,
    latency: Option<Duration>,
    created: Instant,
}

impl Default for MockCube {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCube {
    /// Powered-off lamp with no injected errors or latency.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LampState::default()),
            errors: ErrorConfig::none(),
            latency: None,
            created: Instant::now(),
        }
    }

    /// Attach an error injection configuration.
    pub fn with_errors(mut self, errors: ErrorConfig) -> Self {
        self.errors = errors;
        self
    }

    /// Delay every command by `latency` before it takes effect.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The injection config, e.g. to `reset()` it mid-test.
    pub fn error_config(&self) -> &ErrorConfig {
        &self.errors
    }

    /// Current power state.
    pub fn is_on(&self) -> bool {
        self.lock().powered
    }

    /// Whether frames are currently accepted.
    pub fn in_direct_mode(&self) -> bool {
        self.lock().direct_mode
    }

    /// Every accepted command, oldest first.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.lock().log.clone()
    }

    /// Accepted commands without timestamps.
    pub fn commands(&self) -> Vec<LampEvent> {
        self.lock().log.iter().map(|r| r.event.clone()).collect()
    }

    /// Wire frames received, in order.
    pub fn frames(&self) -> Vec<String> {
        self.lock()
            .log
            .iter()
            .filter_map(|r| match &r.event {
                LampEvent::Frame(wire) => Some(wire.clone()),
                _ => None,
            })
            .collect()
    }

    /// Received frames decoded back into matrices.
    pub fn matrices(&self) -> Result<Vec<Matrix>> {
        self.frames()
            .iter()
            .map(|wire| Matrix::from_wire_encoding(wire).map_err(anyhow::Error::from))
            .collect()
    }

    /// Number of frames received.
    pub fn frame_count(&self) -> usize {
        self.lock()
            .log
            .iter()
            .filter(|r| matches!(r.event, LampEvent::Frame(_)))
            .count()
    }

    /// Forget recorded commands; power and mode are kept.
    pub fn clear_log(&self) {
        self.lock().log.clear();
    }

    fn lock(&self) -> MutexGuard<'_, LampState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate(&self, operation: &'static str) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.errors.check_operation(operation).map_err(|e| {
            tracing::debug!(operation, error = %e, "MockCube: injected failure");
            e
        })
    }

    fn record(state: &mut LampState, at: Duration, event: LampEvent) {
        tracing::trace!(?event, ?at, "MockCube: accepted");
        state.log.push(RecordedEvent { at, event });
    }
}

#[async_trait]
impl DeviceLink for MockCube {
    async fn send_frame(&self, wire_frame: &str) -> Result<()> {
        self.simulate(OP_SEND_FRAME).await?;
        if wire_frame.len() != WIRE_LEN {
            anyhow::bail!(
                "frame must be {} characters, got {}",
                WIRE_LEN,
                wire_frame.len()
            );
        }
        let at = self.created.elapsed();
        let mut state = self.lock();
        if !state.powered {
            tracing::warn!("MockCube: frame received while the lamp is off");
        }
        Self::record(&mut state, at, LampEvent::Frame(wire_frame.to_string()));
        Ok(())
    }

    async fn set_power(&self, on: bool) -> Result<()> {
        self.simulate(OP_SET_POWER).await?;
        let at = self.created.elapsed();
        let mut state = self.lock();
        state.powered = on;
        if !on {
            state.direct_mode = false;
        }
        let event = if on { LampEvent::PowerOn } else { LampEvent::PowerOff };
        Self::record(&mut state, at, event);
        Ok(())
    }

    async fn enter_direct_mode(&self) -> Result<()> {
        self.simulate(OP_DIRECT_MODE).await?;
        let at = self.created.elapsed();
        let mut state = self.lock();
        state.direct_mode = true;
        Self::record(&mut state, at, LampEvent::DirectMode);
        Ok(())
    }
}
