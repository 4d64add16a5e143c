use serde::{Deserialize, Serialize};

use crate::bank::{CategoryQuantity, Preset};
use crate::replication::SyncPayload;
use crate::state::rewards::RewardSummary;
use crate::state::score::TeamScorePreview;
use crate::state::timer::TimerDisplay;
use crate::types::*;

/// Commands sent by a console over the WebSocket.
///
/// Every command mutates state and is only honoured on a host connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    ConfirmTeams {
        names: Vec<String>,
    },
    StartGame,
    RevealAnswer,
    ToggleCorrect {
        team_id: TeamId,
    },
    NextQuestion,
    SetProjectorLight {
        enabled: bool,
    },
    SetTimerDuration {
        seconds: i64,
    },
    StartTimer,
    SetCategoryQuantity {
        category: String,
        quantity: i64,
    },
    ApplyPreset {
        preset: Preset,
    },
    /// Load another bank file from the data directory
    SelectBank {
        filename: String,
    },
    /// Ask for the host panel again (e.g. after a reconnect)
    RequestPanel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: u32,
        role: Role,
        screen: Screen,
    },
    /// Full replicated state
    Sync(SyncPayload),
    /// Guard violation shown to the host; state is unchanged
    Alert {
        msg: String,
    },
    /// Host-only panel data derived from the state
    HostPanel {
        categories: Vec<CategoryQuantity>,
        total_questions: u32,
        previews: Vec<TeamScorePreview>,
        rewards: RewardSummary,
    },
    BankStatus {
        filename: String,
        questions: usize,
        errors: Vec<String>,
    },
    /// Projector countdown tick
    Timer {
        display: TimerDisplay,
        remaining_ms: i64,
    },
    Error {
        code: String,
        msg: String,
    },
}
