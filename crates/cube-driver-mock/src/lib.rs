//! Mock lamp for rust-cube.
//!
//! [`MockCube`] implements [`cube_core::DeviceLink`] entirely in memory. It
//! records accepted commands, can add per-command latency, and can fail
//! chosen operations through [`ErrorConfig`]. All waiting uses
//! `tokio::time::sleep`, so tests may run with a paused clock.
//!
//! ```rust,ignore
//! use cube_driver_mock::{ErrorConfig, ErrorScenario, MockCube};
//!
//! let lamp = MockCube::new().with_errors(ErrorConfig::scenario(
//!     ErrorScenario::FailAfterN { operation: "send_frame", count: 3 },
//! ));
//! ```

pub mod errors;
mod mock_cube;

pub use errors::{ErrorConfig, ErrorScenario};
pub use mock_cube::{LampEvent, MockCube, RecordedEvent};
