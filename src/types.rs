use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque ID types for readability
pub type TeamId = String;
pub type QuestionId = String;

/// Coarse grouping of the specific bank categories.
///
/// Serialized with the same keys the projector uses for `rewards.general`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeneralCategory {
    Maths,
    Science,
    History,
    Entertainment,
    PopCulture,
    WorldCulture,
    Mythology,
}

impl GeneralCategory {
    pub const ALL: [GeneralCategory; 7] = [
        GeneralCategory::Maths,
        GeneralCategory::Science,
        GeneralCategory::History,
        GeneralCategory::Entertainment,
        GeneralCategory::PopCulture,
        GeneralCategory::WorldCulture,
        GeneralCategory::Mythology,
    ];

    /// Wire key (matches the serde representation)
    pub fn key(self) -> &'static str {
        match self {
            GeneralCategory::Maths => "Maths",
            GeneralCategory::Science => "Science",
            GeneralCategory::History => "History",
            GeneralCategory::Entertainment => "Entertainment",
            GeneralCategory::PopCulture => "PopCulture",
            GeneralCategory::WorldCulture => "WorldCulture",
            GeneralCategory::Mythology => "Mythology",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.key() == key)
    }

    /// Human readable label for host panels
    pub fn label(self) -> &'static str {
        match self {
            GeneralCategory::PopCulture => "Pop Culture",
            GeneralCategory::WorldCulture => "World & Culture",
            other => other.key(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Medium,
    Hard,
    VeryHard,
    ChristmasHard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
        Difficulty::ChristmasHard,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::VeryHard => "very-hard",
            Difficulty::ChristmasHard => "christmas-hard",
        }
    }

    /// Strict parse of a bank difficulty string
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }

    /// Lenient parse used when projecting untrusted records.
    ///
    /// Unknown values starting with "christmas" (e.g. "christmas-medium") still
    /// mark a Christmas question; anything else falls back to medium.
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            if s.trim().to_lowercase().starts_with("christmas") {
                Difficulty::ChristmasHard
            } else {
                Difficulty::Medium
            }
        })
    }
}

/// Media attached to a question, already validated (non-empty `src`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Media {
    Audio {
        src: String,
        title: String,
    },
    Video {
        src: String,
        title: String,
        poster: String,
    },
    Image {
        src: String,
        title: String,
    },
}

/// A question as carried in the session queue (trimmed projection of a bank record)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub category: String,
    pub difficulty: Difficulty,
    pub question: String,
    pub answer: String,
    pub christmas: bool,
    pub host_notes: String,
    pub media: Option<Media>,
}

impl Question {
    /// Christmas questions draw a reward and never receive general bonuses
    pub fn is_christmas(&self) -> bool {
        self.christmas || self.difficulty == Difficulty::ChristmasHard
    }
}

/// A consumable bonus from the fixed twelve-day catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reward {
    pub day: u8,
    pub name: String,
    pub general: Vec<GeneralCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamRewards {
    /// General category -> flat +1 bonus active
    pub general: BTreeMap<GeneralCategory, bool>,
    /// Reward day (as string key) -> currently equipped
    pub days: BTreeMap<String, bool>,
}

impl Default for TeamRewards {
    fn default() -> Self {
        Self {
            general: GeneralCategory::ALL.into_iter().map(|g| (g, false)).collect(),
            days: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub score: u32,
    pub rewards: TeamRewards,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub queue: Vec<Question>,
    /// 0-based cursor, `index <= queue.len()`
    pub index: usize,
    pub revealed: bool,
    /// Cleared on every question transition
    pub applied_by_team_id: BTreeMap<TeamId, bool>,
    /// Reward drawn for the current question, if any
    pub christmas_reward: Option<Reward>,
}

pub const DEFAULT_TIMER_SECONDS: u32 = 30;
pub const MIN_TIMER_SECONDS: u32 = 5;
pub const MAX_TIMER_SECONDS: u32 = 600;

/// Host-controlled question timer, expressed as a wall-clock deadline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub duration_sec: u32,
    pub running: bool,
    pub ends_at_ms: i64,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            duration_sec: DEFAULT_TIMER_SECONDS,
            running: false,
            ends_at_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RewardPool {
    /// Undrawn rewards for the current game, front is drawn next
    pub remaining: Vec<Reward>,
}

/// The single replicated root
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub teams: Vec<Team>,
    pub teams_locked: bool,
    pub session: SessionState,
    pub projector_light: bool,
    pub timer: TimerState,
    pub rewards: RewardPool,
}

impl GameState {
    pub fn current_question(&self) -> Option<&Question> {
        self.session.queue.get(self.session.index)
    }

    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Which screen a renderer should show for this state
    pub fn screen(&self) -> Screen {
        if self.session.queue.is_empty() {
            Screen::Selection
        } else if self.session.index >= self.session.queue.len() {
            Screen::Over
        } else {
            Screen::Quiz
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.screen() == Screen::Over
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Selection,
    Quiz,
    Over,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Viewer,
}

impl Role {
    /// `?host=true` selects the host console, anything else is a viewer
    pub fn from_host_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("true") => Role::Host,
            _ => Role::Viewer,
        }
    }
}
