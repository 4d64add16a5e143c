//! Question timer. Advisory only: it never gates a transition.
//!
//! The timer is a wall-clock deadline, so every client recomputes the
//! remaining time locally and replication delay does not skew it.

use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::types::*;

use super::AppState;

/// What a projector should show for the timer right now
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum TimerDisplay {
    Hidden,
    Counting(String),
    TimesUp,
}

/// `m:ss`, rounding partial seconds up
pub fn format_clock(ms_remaining: i64) -> String {
    let total_seconds = ms_remaining.max(0).saturating_add(999) / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl TimerState {
    pub fn set_duration(&mut self, seconds: i64) {
        self.duration_sec =
            seconds.clamp(i64::from(MIN_TIMER_SECONDS), i64::from(MAX_TIMER_SECONDS)) as u32;
    }

    pub fn start(&mut self, now_ms: i64) {
        self.running = true;
        self.ends_at_ms = now_ms.saturating_add(i64::from(self.duration_sec) * 1000);
    }

    /// Back to stopped, keeping the configured duration
    pub fn reset(&mut self) {
        self.running = false;
        self.ends_at_ms = 0;
    }

    /// Milliseconds until the deadline; 0 when not running
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        if !self.running || self.ends_at_ms == 0 {
            return 0;
        }
        self.ends_at_ms.saturating_sub(now_ms)
    }

    pub fn display(&self, now_ms: i64) -> TimerDisplay {
        if !self.running || self.ends_at_ms <= 0 {
            return TimerDisplay::Hidden;
        }
        let remaining = self.remaining_ms(now_ms);
        if remaining > 0 {
            TimerDisplay::Counting(format_clock(remaining))
        } else {
            TimerDisplay::TimesUp
        }
    }
}

impl AppState {
    /// Set the per-question duration (clamped to 5..=600 seconds)
    pub async fn set_timer_duration(&self, seconds: i64) {
        if !self.is_host() {
            return;
        }
        let mut game = self.game.write().await;
        game.timer.set_duration(seconds);
        tracing::info!("Timer duration set to {}s", game.timer.duration_sec);
        self.replicator.publish(&game).await;
    }

    /// Start counting down the current question
    pub async fn start_timer(&self) -> Result<(), FlowError> {
        self.start_timer_at(now_ms()).await
    }

    pub async fn start_timer_at(&self, now_ms: i64) -> Result<(), FlowError> {
        if !self.is_host() {
            return Ok(());
        }
        let mut game = self.game.write().await;
        if game.current_question().is_none() {
            return Err(FlowError::NoCurrentQuestion);
        }
        game.timer.start(now_ms);
        tracing::info!("Timer started for {}s", game.timer.duration_sec);
        self.replicator.publish(&game).await;
        Ok(())
    }

    /// Host-controlled projector theme
    pub async fn set_projector_light(&self, enabled: bool) {
        if !self.is_host() {
            return;
        }
        let mut game = self.game.write().await;
        game.projector_light = enabled;
        self.replicator.publish(&game).await;
    }
}
