//! `cube-core`
//!
//! Core types for rust-cube, the Yeelight Cube matrix animator.
//!
//! Data flows text → [`script::compile`] → [`Script`] frames → wire encoding →
//! [`DeviceLink`]. This crate owns everything up to the link:
//!
//! - [`color`]: 24-bit colors and the lamp's packed 4-character encoding
//! - [`matrix`]: the 5x5 grid, checked cell access, rotation, serialization
//! - [`raster`]: shape primitives (circle, ring, line, cross, shift, dim, ...)
//! - [`script`]: the line-oriented script compiler
//! - [`capabilities`]: the [`DeviceLink`] trait drivers implement
//! - [`error`]: [`CubeError`] and the per-stage error taxonomy

pub mod capabilities;
pub mod color;
pub mod error;
pub mod matrix;
pub mod raster;
pub mod script;

pub use capabilities::DeviceLink;
pub use color::Color;
pub use error::{CubeError, CubeResult, DeviceError, ErrorStage, ParseError};
pub use matrix::{Matrix, RotationMapping, Vector};
pub use raster::{Direction, RectBounds};
pub use script::{compile, compile_with, CompileOptions, Script};
