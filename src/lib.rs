//! # rust-cube
//!
//! Compiles mnemonic animation scripts into 5x5 frames and plays them on a
//! Yeelight Cube. The heavy lifting lives in the workspace crates:
//!
//! - `cube-core`: colors, the matrix, shape primitives, the script compiler
//! - `cube-playback`: the single-session [`Player`](cube_playback::Player)
//! - `cube-driver-yeelight` / `cube-driver-mock`: device links
//!
//! This crate adds what the `rust-cube` binary needs around them:
//!
//! - **`config`**: layered configuration (defaults, TOML, environment)
//! - **`logging`**: `tracing-subscriber` setup
//! - **`library`**: the directory of script files
//! - **`runner`**: foreground playback with shutdown handling

pub mod config;
pub mod library;
pub mod logging;
pub mod runner;

pub use config::CubeConfig;
pub use library::ScriptLibrary;
