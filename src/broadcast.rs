use crate::protocol::ServerMessage;
use crate::state::timer::{now_ms, TimerDisplay};
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

const TIMER_TICK: Duration = Duration::from_millis(250);

/// Spawn a background task that applies every replicated payload to a
/// viewer-role state. Lagged receivers skip ahead; the latest payload wins anyway.
pub fn spawn_viewer_sync(state: Arc<AppState>) -> JoinHandle<()> {
    let mut rx = state.replicator.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(payload) => {
                    state.apply_payload(&payload).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Viewer sync lagged, skipped {} payload(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Spawn a background task that sends countdown ticks to viewers while the
/// timer runs. A finished countdown sends one "time's up" tick and then stays
/// quiet until the timer is restarted.
pub fn spawn_timer_broadcaster(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut finished_deadline = None;

        loop {
            tokio::time::sleep(TIMER_TICK).await;

            let timer = state.snapshot().await.timer;
            if !timer.running {
                finished_deadline = None;
                continue;
            }
            if finished_deadline == Some(timer.ends_at_ms) {
                continue;
            }

            let now = now_ms();
            let display = timer.display(now);
            if display == TimerDisplay::TimesUp {
                finished_deadline = Some(timer.ends_at_ms);
            }

            // Ignore send errors (no viewers connected is fine)
            let _ = state.viewer_broadcast.send(ServerMessage::Timer {
                display,
                remaining_ms: timer.remaining_ms(now).max(0),
            });
        }
    })
}
