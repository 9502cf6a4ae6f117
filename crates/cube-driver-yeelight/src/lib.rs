//! Yeelight Cube driver for rust-cube.
//!
//! Talks to the lamp's LAN control port with newline-delimited JSON:
//!
//! - [`protocol`]: [`LampCommand`], color flows, request/response types
//! - [`client`]: [`YeelightClient`], connect/response timeouts and
//!   optional connection reuse
//! - [`driver`]: [`YeelightCube`], typed operations, property queries and
//!   the [`cube_core::DeviceLink`] implementation
//!
//! A reply that does not arrive within the response timeout is treated as
//! success: the lamp frequently applies commands without answering.

pub mod client;
pub mod driver;
pub mod protocol;

pub use client::{YeelightClient, DEFAULT_PORT};
pub use driver::{YeelightConfig, YeelightCube};
pub use protocol::{CfAction, Effect, FlowMode, FlowState, LampCommand, Response};
