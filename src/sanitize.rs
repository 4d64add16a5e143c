//! Normalization of untrusted state into the canonical [`GameState`].
//!
//! Every state the process treats as current passes through [`sanitize_state`]:
//! payloads from the host, the persisted snapshot slot and imported backups.
//! The functions here are total. Each field is coerced on its own and falls
//! back to a default, unknown fields are dropped.

use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::catalog::{reward_by_day, REWARD_COUNT};
use crate::types::*;

/// Default name for a team entry without a usable name
const DEFAULT_TEAM_NAME: &str = "Team";
/// Default category for a queue entry without one
const DEFAULT_CATEGORY: &str = "Unknown";

/// Build a canonical [`GameState`] from any JSON value
pub fn sanitize_state(raw: &Value) -> GameState {
    let session = raw.get("session");
    let timer = raw.get("timer");

    let mut seen_ids = HashSet::new();
    let teams = raw
        .get("teams")
        .and_then(Value::as_array)
        .map(|teams| {
            teams
                .iter()
                .map(|t| {
                    let mut team = sanitize_team(t);
                    // IDs must stay unique, later duplicates get a fresh one
                    while !seen_ids.insert(team.id.clone()) {
                        team.id = ulid::Ulid::new().to_string();
                    }
                    team
                })
                .collect()
        })
        .unwrap_or_default();

    let queue: Vec<Question> = session
        .and_then(|s| s.get("queue"))
        .and_then(Value::as_array)
        .map(|queue| queue.iter().map(sanitize_question).collect())
        .unwrap_or_default();

    let index = if queue.is_empty() {
        0
    } else {
        (clamp0(session.and_then(|s| s.get("index"))).floor() as usize).min(queue.len())
    };

    let duration_sec = match timer.and_then(|t| t.get("durationSec")) {
        None | Some(Value::Null) => DEFAULT_TIMER_SECONDS,
        value => clamp_int(
            value,
            i64::from(MIN_TIMER_SECONDS),
            i64::from(MAX_TIMER_SECONDS),
        ) as u32,
    };

    // A negative deadline means "not running"
    let ends_at_ms = coerce_number(timer.and_then(|t| t.get("endsAtMs")))
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n.floor() as i64)
        .unwrap_or(0);

    GameState {
        teams,
        teams_locked: truthy(raw.get("teamsLocked")),
        session: SessionState {
            queue,
            index,
            revealed: truthy(session.and_then(|s| s.get("revealed"))),
            applied_by_team_id: bool_map(session.and_then(|s| s.get("appliedByTeamId"))),
            christmas_reward: session
                .and_then(|s| s.get("christmasReward"))
                .and_then(sanitize_reward),
        },
        projector_light: truthy(raw.get("projectorLight")),
        timer: TimerState {
            duration_sec,
            running: truthy(timer.and_then(|t| t.get("running"))),
            ends_at_ms,
        },
        rewards: RewardPool {
            remaining: raw
                .get("rewards")
                .and_then(|r| r.get("remaining"))
                .and_then(Value::as_array)
                .map(|rs| rs.iter().filter_map(sanitize_reward).collect())
                .unwrap_or_default(),
        },
    }
}

fn sanitize_team(raw: &Value) -> Team {
    let rewards = raw.get("rewards");
    let general_raw = rewards.and_then(|r| r.get("general"));

    Team {
        id: coerce_string(raw.get("id")).unwrap_or_else(|| ulid::Ulid::new().to_string()),
        name: coerce_string(raw.get("name")).unwrap_or_else(|| DEFAULT_TEAM_NAME.to_string()),
        score: clamp0(raw.get("score")).floor() as u32,
        rewards: TeamRewards {
            general: GeneralCategory::ALL
                .into_iter()
                .map(|g| (g, truthy(general_raw.and_then(|m| m.get(g.key())))))
                .collect(),
            days: bool_map(rewards.and_then(|r| r.get("days"))),
        },
    }
}

/// Rebuild one queue entry field by field
pub fn sanitize_question(raw: &Value) -> Question {
    let difficulty = coerce_string(raw.get("difficulty"))
        .map(|d| Difficulty::parse_lenient(&d))
        .unwrap_or(Difficulty::Medium);

    Question {
        id: coerce_string(raw.get("id")).unwrap_or_else(|| ulid::Ulid::new().to_string()),
        category: coerce_string(raw.get("category"))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        difficulty,
        question: coerce_string(raw.get("question")).unwrap_or_default(),
        answer: coerce_string(raw.get("answer")).unwrap_or_default(),
        christmas: truthy(raw.get("christmas")),
        host_notes: if truthy(raw.get("hostNotes")) {
            coerce_string(raw.get("hostNotes")).unwrap_or_default()
        } else {
            String::new()
        },
        media: raw.get("media").and_then(sanitize_media),
    }
}

/// Normalize a media descriptor.
///
/// Accepts a single object or an array of candidates (first valid wins).
/// Returns `None` for unknown types or an empty `src`.
pub fn sanitize_media(raw: &Value) -> Option<Media> {
    match raw {
        Value::Array(candidates) => candidates.iter().find_map(sanitize_media),
        Value::Object(_) => {
            let kind = coerce_string(raw.get("type"))
                .unwrap_or_default()
                .to_lowercase();
            let src = coerce_string(raw.get("src"))
                .unwrap_or_default()
                .trim()
                .to_string();
            if src.is_empty() {
                return None;
            }
            let title = optional_text(raw.get("title"));

            match kind.as_str() {
                "audio" => Some(Media::Audio { src, title }),
                "video" => Some(Media::Video {
                    src,
                    title,
                    poster: optional_text(raw.get("poster")).trim().to_string(),
                }),
                "image" => Some(Media::Image { src, title }),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Normalize a reward entry. The day must name a catalog entry.
pub fn sanitize_reward(raw: &Value) -> Option<Reward> {
    if !raw.is_object() {
        return None;
    }
    let day = coerce_number(raw.get("day")).filter(|n| n.is_finite())?.floor();
    if day < 1.0 || day > REWARD_COUNT as f64 {
        return None;
    }
    let day = day as u8;
    let known = reward_by_day(day);

    let name = coerce_string(raw.get("name"))
        .or_else(|| known.as_ref().map(|r| r.name.clone()))
        .unwrap_or_default();

    let general = match raw.get("general").and_then(Value::as_array) {
        Some(keys) => keys
            .iter()
            .filter_map(Value::as_str)
            .filter_map(GeneralCategory::from_key)
            .take(2)
            .collect(),
        None => known.map(|r| r.general).unwrap_or_default(),
    };

    Some(Reward { day, name, general })
}

// =========================================================================
// Coercion helpers
// =========================================================================

/// Truthiness of an optional JSON value (missing, null, false, 0, "" are false)
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Numeric coercion. `None` means "not a number".
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok().filter(|n| !n.is_nan())
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Scalar to string; missing, null and compound values yield `None`
pub fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Non-negative finite number, anything unusable becomes 0
pub fn clamp0(value: Option<&Value>) -> f64 {
    coerce_number(value)
        .filter(|n| n.is_finite())
        .map(|n| n.max(0.0))
        .unwrap_or(0.0)
}

/// Floor and clamp into `[min, max]`; non-numbers yield `min`
pub fn clamp_int(value: Option<&Value>, min: i64, max: i64) -> i64 {
    match coerce_number(value).filter(|n| n.is_finite()) {
        Some(n) => (n.floor() as i64).clamp(min, max),
        None => min,
    }
}

fn optional_text(value: Option<&Value>) -> String {
    if truthy(value) {
        coerce_string(value).unwrap_or_default()
    } else {
        String::new()
    }
}

fn bool_map(value: Option<&Value>) -> BTreeMap<String, bool> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), truthy(Some(v))))
                .collect()
        })
        .unwrap_or_default()
}
