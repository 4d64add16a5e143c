//! Host-only command handlers
//!
//! Authorization is checked in the dispatch layer before calling these.
//! State changes reach the projectors through the replicator; the reply here
//! is either fresh host panel data or an alert.

use crate::bank::Preset;
use crate::error::FlowError;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

/// Derived data for the host panel
pub async fn host_panel(state: &Arc<AppState>) -> ServerMessage {
    let config = state.category_config().await;
    ServerMessage::HostPanel {
        total_questions: config.total(),
        categories: config.entries,
        previews: state.score_previews().await,
        rewards: state.reward_summary().await,
    }
}

pub async fn bank_status(state: &Arc<AppState>) -> ServerMessage {
    let status = state.bank_status().await;
    ServerMessage::BankStatus {
        filename: status.filename,
        questions: status.questions,
        errors: status.errors,
    }
}

/// Panel on success, alert on a guard violation
async fn reply(state: &Arc<AppState>, result: Result<(), FlowError>) -> Option<ServerMessage> {
    match result {
        Ok(()) => Some(host_panel(state).await),
        Err(e) => Some(ServerMessage::Alert { msg: e.to_string() }),
    }
}

pub async fn handle_confirm_teams(
    state: &Arc<AppState>,
    names: Vec<String>,
) -> Option<ServerMessage> {
    reply(state, state.confirm_teams(names).await).await
}

pub async fn handle_start_game(state: &Arc<AppState>) -> Option<ServerMessage> {
    reply(state, state.start_game().await).await
}

pub async fn handle_reveal_answer(state: &Arc<AppState>) -> Option<ServerMessage> {
    reply(state, state.reveal_answer().await).await
}

pub async fn handle_toggle_correct(
    state: &Arc<AppState>,
    team_id: String,
) -> Option<ServerMessage> {
    reply(state, state.toggle_correct(&team_id).await).await
}

pub async fn handle_next_question(state: &Arc<AppState>) -> Option<ServerMessage> {
    reply(state, state.next_question().await).await
}

pub async fn handle_set_projector_light(
    state: &Arc<AppState>,
    enabled: bool,
) -> Option<ServerMessage> {
    state.set_projector_light(enabled).await;
    None
}

pub async fn handle_set_timer_duration(
    state: &Arc<AppState>,
    seconds: i64,
) -> Option<ServerMessage> {
    state.set_timer_duration(seconds).await;
    None
}

pub async fn handle_start_timer(state: &Arc<AppState>) -> Option<ServerMessage> {
    match state.start_timer().await {
        Ok(()) => None,
        Err(e) => Some(ServerMessage::Alert { msg: e.to_string() }),
    }
}

pub async fn handle_set_category_quantity(
    state: &Arc<AppState>,
    category: String,
    quantity: i64,
) -> Option<ServerMessage> {
    reply(state, state.set_category_quantity(&category, quantity).await).await
}

pub async fn handle_apply_preset(state: &Arc<AppState>, preset: Preset) -> Option<ServerMessage> {
    state.apply_preset(preset).await;
    Some(host_panel(state).await)
}

pub async fn handle_select_bank(state: &Arc<AppState>, filename: String) -> Option<ServerMessage> {
    tracing::info!("Host selecting bank {}", filename);
    match state.select_bank(&filename).await {
        Ok(_) => Some(bank_status(state).await),
        Err(e) => {
            tracing::error!("Bank selection failed: {}", e);
            Some(ServerMessage::Alert { msg: e.to_string() })
        }
    }
}
