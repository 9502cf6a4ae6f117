//! Playback scheduler for rust-cube.
//!
//! A [`Player`] owns at most one session. Starting a session powers the lamp
//! on, enters direct mode and spawns a task that renders frames in cyclic
//! order at a fixed interval. The session ends on [`Player::stop`], on its
//! timeout, or when the player is dropped; every exit path powers the lamp
//! off. Render failures are reported through [`PlaybackEvent`]s and never
//! end a session.

pub mod events;
mod player;
mod session;

pub use events::{FinishReason, PlaybackEvent, PlaybackState, SessionReport};
pub use player::Player;
