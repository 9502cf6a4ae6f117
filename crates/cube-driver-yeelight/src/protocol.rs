//! Yeelight LAN control protocol.
//!
//! Requests and responses are single JSON objects, one per line, each line
//! terminated by `\r\n`:
//!
//! ```text
//! -> {"id":1234,"method":"set_power","params":["on","smooth",200]}
//! <- {"id":1234,"result":["ok"]}
//! <- {"id":1234,"error":{"code":-1,"message":"unsupported method"}}
//! <- {"method":"props","params":{"power":"on"}}      (notification, no id)
//! ```

use cube_core::Color;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Transition used when the lamp is told to change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Change immediately.
    Sudden,
    /// Fade over the given number of milliseconds.
    Smooth(u32),
}

impl Effect {
    /// `0` means an immediate change.
    pub fn from_millis(ms: u32) -> Self {
        if ms == 0 {
            Effect::Sudden
        } else {
            Effect::Smooth(ms)
        }
    }

    fn params(self) -> [Value; 2] {
        match self {
            Effect::Sudden => [json!("sudden"), json!(0)],
            Effect::Smooth(ms) => [json!("smooth"), json!(ms)],
        }
    }
}

/// Kind of a [`FlowState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowMode {
    /// `value` is an RGB color.
    Color = 1,
    /// `value` is a color temperature in kelvin.
    Temperature = 2,
    /// Hold the previous state.
    Sleep = 7,
}

/// What the lamp does once a color flow ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CfAction {
    /// Return to the state before the flow started.
    #[default]
    Recover = 0,
    /// Keep the last flow state.
    Stay = 1,
    /// Switch off.
    Off = 2,
}

/// One step of a color flow: `duration,mode,value,brightness`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowState {
    /// Step length in milliseconds.
    pub duration_ms: u32,
    /// How `value` is interpreted.
    pub mode: FlowMode,
    /// RGB value, kelvin, or 0 for sleep.
    pub value: u32,
    /// `-1` keeps the current brightness.
    pub brightness: i8,
}

impl FlowState {
    /// Fade to `color`.
    pub fn color(duration_ms: u32, color: Color, brightness: i8) -> Self {
        Self {
            duration_ms,
            mode: FlowMode::Color,
            value: color.value(),
            brightness,
        }
    }

    /// Fade to a white temperature.
    pub fn temperature(duration_ms: u32, kelvin: u16, brightness: i8) -> Self {
        Self {
            duration_ms,
            mode: FlowMode::Temperature,
            value: u32::from(kelvin),
            brightness,
        }
    }

    /// Pause without changing anything.
    pub fn sleep(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            mode: FlowMode::Sleep,
            value: 0,
            brightness: 0,
        }
    }

    fn expression(&self) -> String {
        format!(
            "{},{},{},{}",
            self.duration_ms, self.mode as u8, self.value, self.brightness
        )
    }
}

/// Join flow states into the comma-separated expression `start_cf` expects.
pub fn flow_expression(states: &[FlowState]) -> String {
    states
        .iter()
        .map(FlowState::expression)
        .collect::<Vec<_>>()
        .join(",")
}

/// Every method the driver sends.
#[derive(Debug, Clone, PartialEq)]
pub enum LampCommand {
    /// `set_power`
    SetPower {
        /// Target power state
        on: bool,
        /// Transition
        effect: Effect,
    },
    /// `activate_fx_mode` with `{"mode":"direct"}`.
    ActivateDirectMode,
    /// Raw wire frame for the matrix.
    UpdateLeds(String),
    /// `set_rgb`: whole-lamp color.
    SetRgb {
        /// Target color
        color: Color,
        /// Transition
        effect: Effect,
    },
    /// `set_bright`
    SetBright {
        /// 1..=100
        percent: u8,
        /// Transition
        effect: Effect,
    },
    /// `set_ct_abx`
    SetColorTemperature {
        /// 1700..=6500
        kelvin: u16,
        /// Transition
        effect: Effect,
    },
    /// `toggle`
    Toggle,
    /// `get_prop` with property names.
    GetProp(Vec<String>),
    /// `cron_add` type 0: power off after the given minutes.
    SleepAfter {
        /// Delay before switching off
        minutes: u8,
    },
    /// `start_cf`
    StartColorFlow {
        /// `0` loops forever.
        count: u32,
        /// What happens after the last step
        action: CfAction,
        /// Steps in order
        states: Vec<FlowState>,
    },
    /// `stop_cf`
    StopColorFlow,
    /// `set_name`
    SetName(String),
}

impl LampCommand {
    /// JSON `method` name.
    pub fn method(&self) -> &'static str {
        match self {
            LampCommand::SetPower { .. } => "set_power",
            LampCommand::ActivateDirectMode => "activate_fx_mode",
            LampCommand::UpdateLeds(_) => "update_leds",
            LampCommand::SetRgb { .. } => "set_rgb",
            LampCommand::SetBright { .. } => "set_bright",
            LampCommand::SetColorTemperature { .. } => "set_ct_abx",
            LampCommand::Toggle => "toggle",
            LampCommand::GetProp(_) => "get_prop",
            LampCommand::SleepAfter { .. } => "cron_add",
            LampCommand::StartColorFlow { .. } => "start_cf",
            LampCommand::StopColorFlow => "stop_cf",
            LampCommand::SetName(_) => "set_name",
        }
    }

    /// JSON `params` array.
    pub fn params(&self) -> Vec<Value> {
        fn with_effect(value: Value, effect: Effect) -> Vec<Value> {
            let [kind, duration] = effect.params();
            vec![value, kind, duration]
        }

        match self {
            LampCommand::SetPower { on, effect } => {
                with_effect(json!(if *on { "on" } else { "off" }), *effect)
            }
            LampCommand::ActivateDirectMode => vec![json!({ "mode": "direct" })],
            LampCommand::UpdateLeds(frame) => vec![json!(frame)],
            LampCommand::SetRgb { color, effect } => with_effect(json!(color.value()), *effect),
            LampCommand::SetBright { percent, effect } => with_effect(json!(percent), *effect),
            LampCommand::SetColorTemperature { kelvin, effect } => {
                with_effect(json!(kelvin), *effect)
            }
            LampCommand::Toggle | LampCommand::StopColorFlow => Vec::new(),
            LampCommand::GetProp(names) => names.iter().map(|n| json!(n)).collect(),
            LampCommand::SleepAfter { minutes } => vec![json!(0), json!(minutes)],
            LampCommand::StartColorFlow {
                count,
                action,
                states,
            } => vec![
                json!(count),
                json!(*action as u8),
                json!(flow_expression(states)),
            ],
            LampCommand::SetName(name) => vec![json!(name)],
        }
    }

    /// Wrap in a request carrying `id`.
    pub fn to_request(&self, id: i32) -> Request {
        Request {
            id,
            method: self.method(),
            params: self.params(),
        }
    }
}

/// A command ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// Correlates the reply.
    pub id: i32,
    /// Method name
    pub method: &'static str,
    /// Positional parameters
    pub params: Vec<Value>,
}

impl Request {
    /// Serialized request including the `\r\n` terminator.
    pub fn to_line(&self) -> serde_json::Result<String> {
        Ok(format!("{}\r\n", serde_json::to_string(self)?))
    }
}

/// Error object returned by the lamp.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LampError {
    /// Lamp error code, usually negative.
    #[serde(default)]
    pub code: i64,
    /// Human-readable reason
    #[serde(default)]
    pub message: String,
}

/// A reply line. Notifications carry no `id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    /// Request id this answers; `None` for notifications.
    #[serde(default)]
    pub id: Option<i64>,
    /// Success payload
    #[serde(default)]
    pub result: Option<Value>,
    /// Failure payload
    #[serde(default)]
    pub error: Option<LampError>,
}

impl Response {
    /// `result` entries as strings; `get_prop` answers with strings anyway.
    pub fn result_strings(&self) -> Vec<String> {
        match &self.result {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The lamp answered `["ok"]`.
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.result_strings().first().map(String::as_str) == Some("ok")
    }
}
