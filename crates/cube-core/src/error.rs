//! Error types for rust-cube.
//!
//! `CubeError` is the umbrella error for the whole workspace. Every variant
//! knows which stage of the pipeline produced it (see [`ErrorStage`]) because
//! recovery differs per stage:
//!
//! - **Compile**: a script failed to parse. Fatal to that script, reported verbatim.
//! - **Start**: the scheduler refused to start, or the lamp rejected the
//!   power-on / direct-mode handshake. The scheduler stays idle.
//! - **Stop**: stop was requested while nothing was playing.
//! - **Render**: a frame could not be delivered during playback. Never fatal;
//!   these travel as [`DeviceError`] values through the playback event stream.
//! - **Config**: configuration could not be loaded or failed validation.

use thiserror::Error;

// =============================================================================
// Stage
// =============================================================================

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStage {
    /// Script parsing and loading.
    Compile,
    /// Starting a session, including the lamp handshake.
    Start,
    /// Stopping a session and powering the lamp off.
    Stop,
    /// Delivering a frame during playback.
    Render,
    /// Loading or validating configuration.
    Config,
}

impl std::fmt::Display for ErrorStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorStage::Compile => "compile",
            ErrorStage::Start => "start",
            ErrorStage::Stop => "stop",
            ErrorStage::Render => "render",
            ErrorStage::Config => "config",
        };
        write!(f, "{}", label)
    }
}

// =============================================================================
// Parse Errors
// =============================================================================

/// A script line that could not be compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    /// 1-based line number in the script text
    pub line: usize,
    /// What was wrong with the line.
    pub reason: String,
}

impl ParseError {
    /// Error for 1-based `line`.
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Device Errors
// =============================================================================

/// A failed exchange with the lamp.
///
/// Device links report failures as `anyhow::Error`; the scheduler converts
/// them into this cloneable form so they can be broadcast to observers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{stage} failed during '{operation}': {message}")]
pub struct DeviceError {
    /// Lamp operation that failed, e.g. `send_frame`.
    pub operation: &'static str,
    /// Stage the failure belongs to.
    pub stage: ErrorStage,
    /// Rendered cause chain.
    pub message: String,
}

impl DeviceError {
    /// Error with a plain message.
    pub fn new(operation: &'static str, stage: ErrorStage, message: impl Into<String>) -> Self {
        Self {
            operation,
            stage,
            message: message.into(),
        }
    }

    /// Capture an `anyhow` error chain, keeping every cause in the message.
    pub fn from_anyhow(operation: &'static str, stage: ErrorStage, err: &anyhow::Error) -> Self {
        Self::new(operation, stage, format!("{:#}", err))
    }
}

// =============================================================================
// CubeError
// =============================================================================

/// Convenience alias for results using the workspace error type.
pub type CubeResult<T> = std::result::Result<T, CubeError>;

/// Primary error type for rust-cube.
#[derive(Error, Debug)]
pub enum CubeError {
    /// Hex text that is not a 24-bit color.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Cell data that does not describe exactly one 5x5 frame.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// A (row, column) pair outside the 5x5 grid.
    #[error("cell ({row}, {column}) is outside the 5x5 matrix")]
    OutOfBounds {
        /// Requested row
        row: usize,
        /// Requested column
        column: usize,
    },

    /// Script text failed to compile.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// No script with this name in the library.
    #[error("script '{0}' not found")]
    ScriptNotFound(String),

    /// Script text compiled to zero frames.
    #[error("script '{0}' contains no frames")]
    EmptyScript(String),

    /// Start requested while a session is active.
    #[error("a script is already running")]
    AlreadyRunning,

    /// Stop requested while idle.
    #[error("no script is running")]
    NotRunning,

    /// The lamp rejected a command.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem failure, e.g. reading a script.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CubeError {
    /// Shorthand for [`CubeError::InvalidColor`].
    pub fn invalid_color(text: impl Into<String>) -> Self {
        Self::InvalidColor(text.into())
    }

    /// Shorthand for [`CubeError::InvalidFrame`].
    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame(reason.into())
    }

    /// Shorthand for [`CubeError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stage of the pipeline that produced this error.
    pub fn stage(&self) -> ErrorStage {
        match self {
            CubeError::InvalidColor(_)
            | CubeError::InvalidFrame(_)
            | CubeError::OutOfBounds { .. }
            | CubeError::Parse(_)
            | CubeError::EmptyScript(_)
            | CubeError::ScriptNotFound(_)
            | CubeError::Io(_) => ErrorStage::Compile,
            CubeError::AlreadyRunning => ErrorStage::Start,
            CubeError::NotRunning => ErrorStage::Stop,
            CubeError::Device(err) => err.stage,
            CubeError::Config(_) => ErrorStage::Config,
        }
    }
}
