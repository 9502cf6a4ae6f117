//! The playback loop run by each session task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cube_core::{DeviceError, DeviceLink, ErrorStage, Script};
use tokio::sync::{broadcast, oneshot};
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::events::{FinishReason, PlaybackEvent, SessionReport};

/// Everything the loop needs, moved into the spawned task.
pub(crate) struct Session {
    pub(crate) link: Arc<dyn DeviceLink>,
    pub(crate) script: Arc<Script>,
    pub(crate) interval: Duration,
    pub(crate) timeout: Option<Duration>,
    pub(crate) events: broadcast::Sender<PlaybackEvent>,
    pub(crate) running: Arc<AtomicBool>,
}

struct Counters {
    rendered: u64,
    failed: u64,
}

impl Session {
    /// Play until stopped, timed out or cancelled, then power the lamp off.
    pub(crate) async fn run(self, mut stop: oneshot::Receiver<()>) -> SessionReport {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        let expiry = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expiry);

        let mut counters = Counters {
            rendered: 0,
            failed: 0,
        };

        let reason = if self.interval.is_zero() {
            self.render(0, &mut counters).await;
            tokio::select! {
                biased;
                signal = &mut stop => stop_reason(signal),
                _ = &mut expiry => FinishReason::TimedOut,
            }
        } else {
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut cursor = 0;
            loop {
                self.render(cursor, &mut counters).await;
                cursor = (cursor + 1) % self.script.len();

                tokio::select! {
                    biased;
                    signal = &mut stop => break stop_reason(signal),
                    _ = &mut expiry => break FinishReason::TimedOut,
                    _ = ticker.tick() => {}
                }
            }
        };

        self.finish(reason, counters).await
    }

    async fn render(&self, index: usize, counters: &mut Counters) {
        let wire = self.script.frames()[index].to_wire_encoding();
        match self.link.send_frame(&wire).await {
            Ok(()) => {
                counters.rendered += 1;
                debug!(script = %self.script.name(), index, "Rendered frame");
                let _ = self.events.send(PlaybackEvent::FrameRendered { index });
            }
            Err(e) => {
                counters.failed += 1;
                let error = DeviceError::from_anyhow("send_frame", ErrorStage::Render, &e);
                warn!(script = %self.script.name(), index, %error, "Frame render failed");
                let _ = self.events.send(PlaybackEvent::RenderFailed { index, error });
            }
        }
    }

    async fn finish(self, reason: FinishReason, counters: Counters) -> SessionReport {
        let power_off_error = match self.link.set_power(false).await {
            Ok(()) => None,
            Err(e) => {
                let error = DeviceError::from_anyhow("set_power", ErrorStage::Stop, &e);
                error!(script = %self.script.name(), %error, "Failed to power off lamp");
                let _ = self.events.send(PlaybackEvent::PowerOffFailed {
                    error: error.clone(),
                });
                Some(error)
            }
        };

        self.running.store(false, Ordering::SeqCst);
        info!(
            script = %self.script.name(),
            %reason,
            frames = counters.rendered,
            "Playback finished"
        );
        let _ = self.events.send(PlaybackEvent::Finished {
            script: self.script.name().to_string(),
            reason,
            frames_rendered: counters.rendered,
        });

        SessionReport {
            script: self.script.name().to_string(),
            reason,
            frames_rendered: counters.rendered,
            render_failures: counters.failed,
            power_off_error,
        }
    }
}

/// A dropped sender means the owning player went away.
fn stop_reason(signal: Result<(), oneshot::error::RecvError>) -> FinishReason {
    match signal {
        Ok(()) => FinishReason::Stopped,
        Err(_) => FinishReason::Cancelled,
    }
}
