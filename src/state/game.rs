//! Game flow state machine.
//!
//! `TeamSetup -> InSession(hidden) -> InSession(revealed) -> next -> ... -> GameOver`
//!
//! The `GameState` methods are the pure transitions; the `AppState` methods
//! add the host check, locking and publishing. A viewer calling a transition
//! gets `Ok(())` and nothing happens.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::queue::build_session_queue;
use super::score::score_breakdown;
use super::AppState;
use crate::error::FlowError;
use crate::types::*;

/// The setup screen offers at most this many team slots
pub const MAX_TEAMS: usize = 10;

impl GameState {
    /// Create one team per slot and lock the roster.
    ///
    /// Names are trimmed; an empty slot becomes "Team N".
    pub fn confirm_teams(&mut self, names: &[String]) -> Result<(), FlowError> {
        if self.teams_locked {
            return Err(FlowError::TeamsLocked);
        }
        if names.is_empty() {
            return Err(FlowError::NoTeams);
        }

        self.teams = names
            .iter()
            .take(MAX_TEAMS)
            .enumerate()
            .map(|(i, name)| {
                let name = name.trim();
                Team {
                    id: ulid::Ulid::new().to_string(),
                    name: if name.is_empty() {
                        format!("Team {}", i + 1)
                    } else {
                        name.to_string()
                    },
                    score: 0,
                    rewards: TeamRewards::default(),
                }
            })
            .collect();
        self.teams_locked = true;
        Ok(())
    }

    /// Guard for [`GameState::start_session`], checked before building a queue
    pub fn can_start(&self) -> Result<(), FlowError> {
        if !self.teams_locked || self.teams.is_empty() {
            return Err(FlowError::TeamsNotLocked);
        }
        Ok(())
    }

    /// Begin a new game over the given queue
    pub fn start_session<R: Rng + ?Sized>(
        &mut self,
        queue: Vec<Question>,
        rng: &mut R,
    ) -> Result<(), FlowError> {
        self.can_start()?;
        if queue.is_empty() {
            return Err(FlowError::EmptyQueue);
        }

        self.session.queue = queue;
        self.session.index = 0;
        self.session.revealed = false;
        self.session.applied_by_team_id.clear();
        self.init_rewards_for_new_game(rng);
        self.timer.reset();
        Ok(())
    }

    /// Show the answer and draw this question's reward (if Christmas)
    pub fn reveal_answer(&mut self) -> Result<(), FlowError> {
        let question = self
            .current_question()
            .cloned()
            .ok_or(FlowError::NoCurrentQuestion)?;
        if self.session.revealed {
            return Err(FlowError::AlreadyRevealed);
        }

        self.session.revealed = true;
        self.session.applied_by_team_id.clear();
        self.draw_reward_for(&question);
        Ok(())
    }

    /// Mark or unmark a team as correct on the revealed question.
    ///
    /// The breakdown is recomputed at undo time, so a toggle pair restores the
    /// score as long as nothing else touched the team in between. The drawn
    /// reward is applied and revoked together with the points.
    pub fn toggle_correct(&mut self, team_id: &str) -> Result<bool, FlowError> {
        if !self.session.revealed {
            return Err(FlowError::NotRevealed);
        }
        let question = self
            .current_question()
            .cloned()
            .ok_or(FlowError::NoCurrentQuestion)?;
        let reward = self
            .session
            .christmas_reward
            .clone()
            .filter(|_| question.is_christmas());
        let applied = self
            .session
            .applied_by_team_id
            .get(team_id)
            .copied()
            .unwrap_or(false);

        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id == team_id)
            .ok_or_else(|| FlowError::UnknownTeam(team_id.to_string()))?;
        let delta = score_breakdown(team, &question).total;

        if applied {
            team.score = team.score.saturating_sub(delta);
            if let Some(reward) = &reward {
                team.rewards.revoke(reward);
            }
        } else {
            team.score = team.score.saturating_add(delta);
            if let Some(reward) = &reward {
                team.rewards.apply(reward);
            }
        }

        self.session
            .applied_by_team_id
            .insert(team_id.to_string(), !applied);
        Ok(!applied)
    }

    /// Move to the next question. Reaching the end of the queue is game over.
    pub fn next_question(&mut self) -> Result<(), FlowError> {
        if self.current_question().is_none() {
            return Err(FlowError::NoCurrentQuestion);
        }

        self.session.index += 1;
        self.session.revealed = false;
        self.session.applied_by_team_id.clear();
        self.session.christmas_reward = None;
        self.timer.reset();
        Ok(())
    }
}

impl AppState {
    pub async fn confirm_teams(&self, names: Vec<String>) -> Result<(), FlowError> {
        if !self.is_host() {
            return Ok(());
        }
        let mut game = self.game.write().await;
        game.confirm_teams(&names)?;
        tracing::info!("Teams locked: {} team(s)", game.teams.len());
        self.replicator.publish(&game).await;
        Ok(())
    }

    pub async fn start_game(&self) -> Result<(), FlowError> {
        let mut rng = StdRng::from_os_rng();
        self.start_game_with(&mut rng).await
    }

    /// Start a game with a caller-provided RNG (deterministic in tests)
    pub async fn start_game_with<R: Rng + Send + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(), FlowError> {
        if !self.is_host() {
            return Ok(());
        }
        let mut game = self.game.write().await;
        game.can_start()?;

        let queue = {
            let bank = self.bank.read().await;
            let config = self.category_config.read().await;
            build_session_queue(&bank, &config, rng)
        };

        game.start_session(queue, rng)?;
        tracing::info!(
            "Game started with {} questions",
            game.session.queue.len()
        );
        self.replicator.publish(&game).await;
        Ok(())
    }

    pub async fn reveal_answer(&self) -> Result<(), FlowError> {
        if !self.is_host() {
            return Ok(());
        }
        let mut game = self.game.write().await;
        game.reveal_answer()?;
        match &game.session.christmas_reward {
            Some(reward) => tracing::info!(
                "Answer revealed for question {}, drew reward day {} ({})",
                game.session.index + 1,
                reward.day,
                reward.name
            ),
            None => tracing::info!("Answer revealed for question {}", game.session.index + 1),
        }
        self.replicator.publish(&game).await;
        Ok(())
    }

    pub async fn toggle_correct(&self, team_id: &str) -> Result<(), FlowError> {
        if !self.is_host() {
            return Ok(());
        }
        let mut game = self.game.write().await;
        let now_applied = game.toggle_correct(team_id)?;
        tracing::info!(
            "Team {} marked {}",
            team_id,
            if now_applied { "correct" } else { "not correct" }
        );
        self.replicator.publish(&game).await;
        Ok(())
    }

    pub async fn next_question(&self) -> Result<(), FlowError> {
        if !self.is_host() {
            return Ok(());
        }
        let mut game = self.game.write().await;
        game.next_question()?;
        if game.is_game_over() {
            tracing::info!("Game over");
        } else {
            tracing::info!(
                "Advanced to question {}/{}",
                game.session.index + 1,
                game.session.queue.len()
            );
        }
        self.replicator.publish(&game).await;
        Ok(())
    }
}
