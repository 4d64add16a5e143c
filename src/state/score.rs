use serde::{Deserialize, Serialize};

use crate::catalog::{general_category_of, points_for};
use crate::types::*;

use super::AppState;

/// Points a team would receive for a question, split by source
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub total: u32,
    pub base: u32,
    pub general: u32,
}

/// Breakdown for one team on the current question (host panel hint)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamScorePreview {
    pub team_id: TeamId,
    pub applied: bool,
    pub breakdown: ScoreBreakdown,
}

/// Base points shown on the question card
pub fn base_points(question: &Question) -> u32 {
    if question.is_christmas() {
        1
    } else {
        points_for(question.difficulty)
    }
}

/// Pure scoring rule.
///
/// Christmas questions are always worth exactly 1 and never receive a
/// general bonus. Otherwise the difficulty sets the base, plus 1 if the team
/// holds a bonus for the question's general category.
pub fn score_breakdown(team: &Team, question: &Question) -> ScoreBreakdown {
    if question.is_christmas() {
        return ScoreBreakdown {
            total: 1,
            base: 1,
            general: 0,
        };
    }

    let base = base_points(question);
    let general = general_category_of(&question.category)
        .filter(|g| team.rewards.general.get(g).copied().unwrap_or(false))
        .map_or(0, |_| 1);

    ScoreBreakdown {
        total: base + general,
        base,
        general,
    }
}

impl GameState {
    /// Breakdowns for every team on the current question, once revealed
    pub fn score_previews(&self) -> Vec<TeamScorePreview> {
        let Some(question) = self.current_question() else {
            return Vec::new();
        };
        if !self.session.revealed {
            return Vec::new();
        }

        self.teams
            .iter()
            .map(|team| TeamScorePreview {
                team_id: team.id.clone(),
                applied: self
                    .session
                    .applied_by_team_id
                    .get(&team.id)
                    .copied()
                    .unwrap_or(false),
                breakdown: score_breakdown(team, question),
            })
            .collect()
    }

    /// Teams ordered by score, highest first (ties keep display order)
    pub fn leaderboard(&self) -> Vec<Team> {
        let mut teams = self.teams.clone();
        teams.sort_by(|a, b| b.score.cmp(&a.score));
        teams
    }
}

impl AppState {
    pub async fn score_previews(&self) -> Vec<TeamScorePreview> {
        self.game.read().await.score_previews()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn team(id: &str) -> Team {
        Team {
            id: id.to_string(),
            name: format!("Team {}", id),
            score: 0,
            rewards: TeamRewards::default(),
        }
    }

    pub(crate) fn question(id: &str, category: &str, difficulty: Difficulty) -> Question {
        Question {
            id: id.to_string(),
            category: category.to_string(),
            difficulty,
            question: format!("Question {}", id),
            answer: format!("Answer {}", id),
            christmas: difficulty == Difficulty::ChristmasHard,
            host_notes: String::new(),
            media: None,
        }
    }

    #[test]
    fn test_hard_question_without_bonus() {
        let t = team("a");
        let q = question("q", "Science (Physics)", Difficulty::Hard);
        assert_eq!(
            score_breakdown(&t, &q),
            ScoreBreakdown {
                total: 2,
                base: 2,
                general: 0
            }
        );
    }

    #[test]
    fn test_general_bonus_applies() {
        let mut t = team("a");
        t.rewards.general.insert(GeneralCategory::Science, true);
        let q = question("q", "Science (Physics)", Difficulty::Hard);
        assert_eq!(
            score_breakdown(&t, &q),
            ScoreBreakdown {
                total: 3,
                base: 2,
                general: 1
            }
        );

        // Bonus for another general category does not count
        let q = question("q", "History (Art)", Difficulty::VeryHard);
        assert_eq!(score_breakdown(&t, &q).total, 3);
    }

    #[test]
    fn test_christmas_question_ignores_bonuses() {
        let mut t = team("a");
        for g in GeneralCategory::ALL {
            t.rewards.general.insert(g, true);
        }
        let q = question("q", "Science (Physics)", Difficulty::ChristmasHard);
        assert_eq!(
            score_breakdown(&t, &q),
            ScoreBreakdown {
                total: 1,
                base: 1,
                general: 0
            }
        );

        // A christmas flag on another band still counts as christmas
        let mut q = question("q", "Science (Physics)", Difficulty::VeryHard);
        q.christmas = true;
        assert_eq!(score_breakdown(&t, &q).total, 1);
    }

    #[test]
    fn test_unknown_category_gets_no_bonus() {
        let mut t = team("a");
        for g in GeneralCategory::ALL {
            t.rewards.general.insert(g, true);
        }
        let q = question("q", "Cooking", Difficulty::Medium);
        assert_eq!(score_breakdown(&t, &q).total, 1);
    }

    #[test]
    fn test_breakdown_is_pure() {
        let t = team("a");
        let q = question("q", "Maths (Algebra)", Difficulty::VeryHard);
        let first = score_breakdown(&t, &q);
        let second = score_breakdown(&t, &q);
        assert_eq!(first, second);
        assert_eq!(t.score, 0);
    }

    #[test]
    fn test_previews_only_after_reveal() {
        let mut state = GameState::default();
        state.teams = vec![team("a"), team("b")];
        state.session.queue = vec![question("q", "Maths (Algebra)", Difficulty::Hard)];
        assert!(state.score_previews().is_empty());

        state.session.revealed = true;
        state.session.applied_by_team_id.insert("b".to_string(), true);
        let previews = state.score_previews();
        assert_eq!(previews.len(), 2);
        assert!(!previews[0].applied);
        assert!(previews[1].applied);
        assert_eq!(previews[1].breakdown.total, 2);
    }

    #[test]
    fn test_leaderboard_order() {
        let mut state = GameState::default();
        let mut a = team("a");
        a.score = 2;
        let mut b = team("b");
        b.score = 5;
        let mut c = team("c");
        c.score = 2;
        state.teams = vec![a, b, c];

        let ids: Vec<_> = state.leaderboard().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
