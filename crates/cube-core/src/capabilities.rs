//! Device capabilities consumed by the playback scheduler.
//!
//! The scheduler only needs three things from a lamp, so that is all
//! [`DeviceLink`] asks for. Drivers (`cube-driver-yeelight`,
//! `cube-driver-mock`) implement it; the scheduler holds an
//! `Arc<dyn DeviceLink>` and never sees the transport.
//!
//! Like the other async capability traits in this workspace, methods are
//! `#[async_trait]`, `Send + Sync`, and report failures with `anyhow::Result`.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn show(link: &dyn DeviceLink, matrix: &Matrix) -> anyhow::Result<()> {
//!     link.set_power(true).await?;
//!     link.enter_direct_mode().await?;
//!     link.send_frame(&matrix.to_wire_encoding()).await
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::matrix::Matrix;

/// The three lamp operations playback depends on.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Display one wire-encoded frame (see [`Matrix::to_wire_encoding`]).
    async fn send_frame(&self, wire_frame: &str) -> Result<()>;

    /// Switch the lamp on or off.
    async fn set_power(&self, on: bool) -> Result<()>;

    /// Put the lamp into direct-control mode so it accepts raw frames.
    async fn enter_direct_mode(&self) -> Result<()>;

    /// Convenience wrapper that encodes `matrix` first.
    async fn show(&self, matrix: &Matrix) -> Result<()> {
        self.send_frame(&matrix.to_wire_encoding()).await
    }
}
