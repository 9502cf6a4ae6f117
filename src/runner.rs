//! Foreground playback for the CLI.
//!
//! [`play`] starts a session and follows its event stream until the session
//! finishes on its own or `shutdown` resolves, in which case it stops the
//! session and waits for the lamp to power off. Either way the returned
//! report is the one the session produced, not a tally of observed events.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cube_core::{CubeError, CubeResult, Script};
use cube_playback::{PlaybackEvent, Player, SessionReport};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Play `script` until it times out or `shutdown` completes.
pub async fn play<F>(
    player: &Player,
    script: Arc<Script>,
    interval: Duration,
    timeout: Duration,
    shutdown: F,
) -> CubeResult<SessionReport>
where
    F: Future<Output = ()>,
{
    let mut events = player.subscribe();
    player.start(script.clone(), interval, timeout).await?;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(PlaybackEvent::FrameRendered { index }) => {
                    debug!(index, "frame\n{}", script.frames()[index]);
                }
                Ok(PlaybackEvent::Finished { .. }) | Err(RecvError::Closed) => break,
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Dropped playback events");
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown requested");
                match player.stop().await {
                    // Ended on its own while the shutdown was pending.
                    Err(CubeError::NotRunning) => break,
                    result => return result,
                }
            }
        }
    }

    player.take_finished().await?.ok_or(CubeError::NotRunning)
}
