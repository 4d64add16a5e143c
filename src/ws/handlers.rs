//! WebSocket message dispatch
//!
//! Every client command mutates state, so each one goes through the host
//! check before reaching the handlers in [`super::host`]. Commands from a
//! viewer connection are dropped without a reply.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

use super::host;

/// Return early (silently) unless the connection is the host console
macro_rules! check_host {
    ($role:expr) => {
        if *$role != Role::Host {
            return None;
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    check_host!(role);

    match msg {
        ClientMessage::ConfirmTeams { names } => host::handle_confirm_teams(state, names).await,
        ClientMessage::StartGame => host::handle_start_game(state).await,
        ClientMessage::RevealAnswer => host::handle_reveal_answer(state).await,
        ClientMessage::ToggleCorrect { team_id } => {
            host::handle_toggle_correct(state, team_id).await
        }
        ClientMessage::NextQuestion => host::handle_next_question(state).await,
        ClientMessage::SetProjectorLight { enabled } => {
            host::handle_set_projector_light(state, enabled).await
        }
        ClientMessage::SetTimerDuration { seconds } => {
            host::handle_set_timer_duration(state, seconds).await
        }
        ClientMessage::StartTimer => host::handle_start_timer(state).await,
        ClientMessage::SetCategoryQuantity { category, quantity } => {
            host::handle_set_category_quantity(state, category, quantity).await
        }
        ClientMessage::ApplyPreset { preset } => host::handle_apply_preset(state, preset).await,
        ClientMessage::SelectBank { filename } => host::handle_select_bank(state, filename).await,
        ClientMessage::RequestPanel => Some(host::host_panel(state).await),
    }
}
