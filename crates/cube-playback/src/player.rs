//! Player - single-session playback scheduler
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐   start()   ┌─────────┐
//! │ Idle │────────────▶│ Running │
//! └──────┘             └────┬────┘
//!    ▲                      │ stop() / timeout / Player dropped
//!    │                      ▼
//!    │               lamp powered off
//!    └──────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let player = Player::new(link);
//! let mut events = player.subscribe();
//!
//! player.start(script, Duration::from_millis(500), Duration::ZERO).await?;
//! // ... later
//! let report = player.stop().await?;
//! println!("{} frames", report.frames_rendered);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cube_core::{CubeError, CubeResult, DeviceError, DeviceLink, ErrorStage, Script};
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::{PlaybackEvent, PlaybackState, SessionReport};
use crate::session::Session;

/// Capacity of the event channel; slow subscribers see `Lagged`.
const EVENT_CAPACITY: usize = 256;

/// Bookkeeping for the one live session.
struct ActiveSession {
    script: String,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<SessionReport>,
    running: Arc<AtomicBool>,
}

impl ActiveSession {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Drives compiled scripts onto a [`DeviceLink`], one session at a time.
pub struct Player {
    link: Arc<dyn DeviceLink>,
    /// Held across the whole of `start` and `stop`.
    session: Mutex<Option<ActiveSession>>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl Player {
    /// Idle player driving `link`.
    pub fn new(link: Arc<dyn DeviceLink>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            link,
            session: Mutex::new(None),
            events,
        }
    }

    /// Subscribe to playback events.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// The lamp this player drives.
    pub fn link(&self) -> &Arc<dyn DeviceLink> {
        &self.link
    }

    /// `Running` while a session is live.
    pub async fn state(&self) -> PlaybackState {
        match self.session.lock().await.as_ref() {
            Some(active) if active.is_running() => PlaybackState::Running,
            _ => PlaybackState::Idle,
        }
    }

    /// Name of the script currently playing.
    pub async fn current_script(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .filter(|active| active.is_running())
            .map(|active| active.script.clone())
    }

    /// Start playing `script`.
    ///
    /// Powers the lamp on and switches it to direct mode, then spawns the
    /// playback loop and returns. A zero `interval` shows the first frame
    /// until stopped; a zero `timeout` plays until stopped.
    ///
    /// # Errors
    ///
    /// * [`CubeError::AlreadyRunning`] if a session is active; it is left alone
    /// * [`CubeError::EmptyScript`] if `script` has no frames
    /// * [`CubeError::Device`] (stage `Start`) if the lamp rejects the
    ///   handshake; the player stays idle
    pub async fn start(
        &self,
        script: impl Into<Arc<Script>>,
        interval: Duration,
        timeout: Duration,
    ) -> CubeResult<()> {
        let script = script.into();
        let mut slot = self.session.lock().await;

        if let Some(active) = slot.as_ref() {
            if active.is_running() {
                return Err(CubeError::AlreadyRunning);
            }
        }
        if let Some(finished) = slot.take() {
            Self::reap(finished).await;
        }

        if script.is_empty() {
            return Err(CubeError::EmptyScript(script.name().to_string()));
        }

        self.link
            .set_power(true)
            .await
            .map_err(|e| DeviceError::from_anyhow("set_power", ErrorStage::Start, &e))?;
        self.link
            .enter_direct_mode()
            .await
            .map_err(|e| DeviceError::from_anyhow("enter_direct_mode", ErrorStage::Start, &e))?;

        let timeout = (!timeout.is_zero()).then_some(timeout);
        info!(
            script = %script.name(),
            frames = script.len(),
            ?interval,
            ?timeout,
            "Starting playback"
        );
        let _ = self.events.send(PlaybackEvent::Started {
            script: script.name().to_string(),
            frames: script.len(),
            interval,
            timeout,
        });

        let running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = oneshot::channel();
        let session = Session {
            link: self.link.clone(),
            script: script.clone(),
            interval,
            timeout,
            events: self.events.clone(),
            running: running.clone(),
        };
        let handle = tokio::spawn(session.run(stop_rx));

        *slot = Some(ActiveSession {
            script: script.name().to_string(),
            stop: stop_tx,
            handle,
            running,
        });
        Ok(())
    }

    /// Stop the running session and wait until the lamp has been powered off.
    ///
    /// # Errors
    ///
    /// [`CubeError::NotRunning`] if no session is active, including one that
    /// already ended by timeout. The report of such a session stays
    /// available through [`Player::take_finished`].
    pub async fn stop(&self) -> CubeResult<SessionReport> {
        let mut slot = self.session.lock().await;
        let active = match slot.take() {
            Some(active) if active.is_running() => active,
            finished => {
                *slot = finished;
                return Err(CubeError::NotRunning);
            }
        };

        info!(script = %active.script, "Stopping playback");
        // The loop may have finished between the check and this send.
        let _ = active.stop.send(());
        Self::join(active.handle).await
    }

    /// Collect the report of a session that ended on its own.
    ///
    /// Returns `Ok(None)` while idle or while a session is still running.
    /// Each report is handed out once; a later `start` discards it.
    pub async fn take_finished(&self) -> CubeResult<Option<SessionReport>> {
        let mut slot = self.session.lock().await;
        match slot.take() {
            Some(finished) if !finished.is_running() => Self::join(finished.handle).await.map(Some),
            running => {
                *slot = running;
                Ok(None)
            }
        }
    }

    async fn join(handle: JoinHandle<SessionReport>) -> CubeResult<SessionReport> {
        handle
            .await
            .map_err(|e| DeviceError::new("playback", ErrorStage::Stop, e.to_string()).into())
    }

    async fn reap(finished: ActiveSession) {
        match finished.handle.await {
            Ok(report) => debug!(
                script = %report.script,
                reason = %report.reason,
                "Reaped finished session"
            ),
            Err(e) => debug!(error = %e, "Finished session task failed"),
        }
    }
}
