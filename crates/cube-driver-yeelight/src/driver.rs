//! Yeelight Cube driver.
//!
//! Wraps [`YeelightClient`] with typed lamp operations and implements
//! [`DeviceLink`] so the playback scheduler can drive a real cube.
//!
//! # Example
//!
//! ```rust,ignore
//! let cube = YeelightCube::from_config(&YeelightConfig {
//!     address: "192.168.1.20".into(),
//!     ..Default::default()
//! })?;
//! cube.power_on().await?;
//! cube.enter_direct_mode().await?;
//! cube.show(&Matrix::make(Color::RED)).await?;
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use cube_core::{Color, DeviceLink};
use serde::{Deserialize, Serialize};

use crate::client::{
    YeelightClient, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_RESPONSE_TIMEOUT_MS,
};
use crate::protocol::{CfAction, Effect, FlowState, LampCommand, Response};

/// Default power transition in milliseconds.
pub const DEFAULT_SMOOTH_MS: u32 = 200;

// =============================================================================
// Configuration
// =============================================================================

/// Connection settings for one cube.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YeelightConfig {
    /// `host` or `host:port` of the lamp.
    pub address: String,

    /// TCP connect timeout (default: 3000)
    pub connect_timeout_ms: u64,

    /// How long to wait for a reply before assuming success (default: 500)
    pub response_timeout_ms: u64,

    /// Reuse one connection for every request (default: false)
    pub persistent: bool,

    /// Power on/off transition; `0` switches immediately (default: 200)
    pub smooth_ms: u32,
}

impl Default for YeelightConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            persistent: false,
            smooth_ms: DEFAULT_SMOOTH_MS,
        }
    }
}

impl YeelightConfig {
    /// Reject an empty address or zero timeouts.
    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            anyhow::bail!("device address is empty");
        }
        if self.connect_timeout_ms == 0 {
            anyhow::bail!("connect_timeout_ms must be positive");
        }
        if self.response_timeout_ms == 0 {
            anyhow::bail!("response_timeout_ms must be positive");
        }
        Ok(())
    }
}

// =============================================================================
// YeelightCube
// =============================================================================

/// A Yeelight Cube reachable over the LAN.
pub struct YeelightCube {
    client: YeelightClient,
    effect: Effect,
}

impl YeelightCube {
    /// Validate `config` and build the client from it.
    pub fn from_config(config: &YeelightConfig) -> Result<Self> {
        config.validate()?;
        let client = YeelightClient::new(config.address.trim())
            .with_timeouts(
                Duration::from_millis(config.connect_timeout_ms),
                Duration::from_millis(config.response_timeout_ms),
            )
            .persistent(config.persistent);
        Ok(Self::with_client(client, config.smooth_ms))
    }

    /// Use a prepared client; `smooth_ms` picks the transition effect.
    pub fn with_client(client: YeelightClient, smooth_ms: u32) -> Self {
        Self {
            client,
            effect: Effect::from_millis(smooth_ms),
        }
    }

    /// The underlying client.
    pub fn client(&self) -> &YeelightClient {
        &self.client
    }

    async fn run(&self, command: LampCommand) -> Result<Option<Response>> {
        let method = command.method();
        self.client
            .send(&command)
            .await
            .with_context(|| format!("{} on {}", method, self.client.address()))
    }

    async fn execute(&self, command: LampCommand) -> Result<()> {
        self.run(command).await.map(|_| ())
    }

    /// Switch on with the configured transition.
    pub async fn power_on(&self) -> Result<()> {
        self.execute(LampCommand::SetPower {
            on: true,
            effect: self.effect,
        })
        .await
    }

    /// Switch off with the configured transition.
    pub async fn power_off(&self) -> Result<()> {
        self.execute(LampCommand::SetPower {
            on: false,
            effect: self.effect,
        })
        .await
    }

    /// Flip the power state.
    pub async fn toggle(&self) -> Result<()> {
        self.execute(LampCommand::Toggle).await
    }

    /// Show a raw wire frame; the lamp must be in direct mode.
    pub async fn update_leds(&self, wire_frame: &str) -> Result<()> {
        self.execute(LampCommand::UpdateLeds(wire_frame.to_string()))
            .await
    }

    /// Whole-lamp color, outside direct mode.
    pub async fn set_rgb(&self, color: Color) -> Result<()> {
        self.execute(LampCommand::SetRgb {
            color,
            effect: self.effect,
        })
        .await
    }

    /// Brightness in percent, 1..=100.
    pub async fn set_brightness(&self, percent: u8) -> Result<()> {
        if !(1..=100).contains(&percent) {
            anyhow::bail!("brightness must be 1..=100, got {}", percent);
        }
        self.execute(LampCommand::SetBright {
            percent,
            effect: self.effect,
        })
        .await
    }

    /// Color temperature in kelvin, 1700..=6500.
    pub async fn set_color_temperature(&self, kelvin: u16) -> Result<()> {
        if !(1700..=6500).contains(&kelvin) {
            anyhow::bail!("color temperature must be 1700..=6500 K, got {}", kelvin);
        }
        self.execute(LampCommand::SetColorTemperature {
            kelvin,
            effect: self.effect,
        })
        .await
    }

    /// Switch off after `minutes`.
    pub async fn sleep_after(&self, minutes: u8) -> Result<()> {
        self.execute(LampCommand::SleepAfter { minutes }).await
    }

    /// Run a color flow `count` times (`0` loops forever).
    pub async fn start_color_flow(
        &self,
        count: u32,
        action: CfAction,
        states: &[FlowState],
    ) -> Result<()> {
        if states.is_empty() {
            anyhow::bail!("color flow needs at least one state");
        }
        self.execute(LampCommand::StartColorFlow {
            count,
            action,
            states: states.to_vec(),
        })
        .await
    }

    /// Stop a running color flow.
    pub async fn stop_color_flow(&self) -> Result<()> {
        self.execute(LampCommand::StopColorFlow).await
    }

    /// Store a device name on the lamp.
    pub async fn set_name(&self, name: &str) -> Result<()> {
        self.execute(LampCommand::SetName(name.to_string())).await
    }

    /// Read properties by name; values come back in request order.
    pub async fn get_props(&self, names: &[&str]) -> Result<Vec<String>> {
        let command = LampCommand::GetProp(names.iter().map(|n| n.to_string()).collect());
        let response = self
            .run(command)
            .await?
            .with_context(|| format!("No reply to get_prop {:?}", names))?;
        let values = response.result_strings();
        if values.len() < names.len() {
            anyhow::bail!(
                "get_prop returned {} values for {} names",
                values.len(),
                names.len()
            );
        }
        Ok(values)
    }

    async fn get_prop(&self, name: &str) -> Result<String> {
        let mut values = self.get_props(&[name]).await?;
        Ok(values.swap_remove(0))
    }

    /// `true` when the lamp reports `power=on`.
    pub async fn power_state(&self) -> Result<bool> {
        let power = self.get_prop("power").await?;
        match power.as_str() {
            "on" => Ok(true),
            "off" => Ok(false),
            other => anyhow::bail!("Unexpected power value '{}'", other),
        }
    }

    /// Current brightness in percent.
    pub async fn brightness(&self) -> Result<u8> {
        let bright = self.get_prop("bright").await?;
        bright
            .parse::<u8>()
            .with_context(|| format!("Failed to parse brightness '{}'", bright))
    }

    /// Current whole-lamp color.
    pub async fn rgb(&self) -> Result<Color> {
        let rgb = self.get_prop("rgb").await?;
        let value = rgb
            .parse::<u32>()
            .with_context(|| format!("Failed to parse rgb '{}'", rgb))?;
        Color::new(value).map_err(anyhow::Error::from)
    }
}

#[async_trait]
impl DeviceLink for YeelightCube {
    async fn send_frame(&self, wire_frame: &str) -> Result<()> {
        self.update_leds(wire_frame).await
    }

    async fn set_power(&self, on: bool) -> Result<()> {
        if on {
            self.power_on().await
        } else {
            self.power_off().await
        }
    }

    async fn enter_direct_mode(&self) -> Result<()> {
        self.execute(LampCommand::ActivateDirectMode).await
    }
}
