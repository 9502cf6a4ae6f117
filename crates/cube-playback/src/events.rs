//! Scheduler state and the events a running session broadcasts.

use std::time::Duration;

use cube_core::DeviceError;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No session; ready to start one.
    Idle,
    /// A session owns the lamp.
    Running,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Running => write!(f, "running"),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// `Player::stop` was called.
    Stopped,
    /// The session timeout elapsed.
    TimedOut,
    /// The owning `Player` was dropped.
    Cancelled,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Stopped => write!(f, "stopped"),
            FinishReason::TimedOut => write!(f, "timed out"),
            FinishReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Name of the script that played.
    pub script: String,
    /// Why the session ended.
    pub reason: FinishReason,
    /// Frames the lamp accepted.
    pub frames_rendered: u64,
    /// Frames the lamp rejected.
    pub render_failures: u64,
    /// Set when the final power-off failed.
    pub power_off_error: Option<DeviceError>,
}

/// Progress notifications from the playback loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The lamp accepted the handshake and the loop was spawned.
    Started {
        /// Script name
        script: String,
        /// Frames in the script
        frames: usize,
        /// Cadence; zero for static mode
        interval: Duration,
        /// Session timeout, if any
        timeout: Option<Duration>,
    },
    /// The lamp accepted a frame.
    FrameRendered {
        /// Frame index within the script
        index: usize,
    },
    /// Delivery failed; playback carries on with the next frame.
    RenderFailed {
        /// Frame index within the script
        index: usize,
        /// What the lamp reported
        error: DeviceError,
    },
    /// The final power-off failed; the lamp may still be lit.
    PowerOffFailed {
        /// What the lamp reported
        error: DeviceError,
    },
    /// Always the last event of a session. The scheduler is idle again.
    Finished {
        /// Script name
        script: String,
        /// Why the session ended
        reason: FinishReason,
        /// Frames the lamp accepted
        frames_rendered: u64,
    },
}
