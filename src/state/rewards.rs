//! Reward ledger: the per-game pool of undrawn rewards and each team's
//! equipped bonuses.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::{reward_by_day, reward_catalog};
use crate::types::*;

/// Reward info for the host panel
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RewardSummary {
    /// Reward drawn for the current question
    pub current: Option<Reward>,
    /// Next reward waiting in the pool
    pub next: Option<Reward>,
    pub remaining: usize,
}

impl TeamRewards {
    /// Equip a reward: its (up to two) general bonuses and its day marker
    pub fn apply(&mut self, reward: &Reward) {
        for g in reward.general.iter().take(2) {
            if let Some(active) = self.general.get_mut(g) {
                *active = true;
            }
        }
        self.days.insert(reward.day.to_string(), true);
    }

    /// Undo [`TeamRewards::apply`].
    ///
    /// A general bonus stays active while another equipped reward day still
    /// grants it, so overlapping rewards do not cancel each other.
    pub fn revoke(&mut self, reward: &Reward) {
        self.days.remove(&reward.day.to_string());

        let still_granted: BTreeSet<GeneralCategory> = self
            .active_days()
            .into_iter()
            .filter_map(reward_by_day)
            .flat_map(|r| r.general)
            .collect();

        for g in reward.general.iter().take(2) {
            if still_granted.contains(g) {
                continue;
            }
            if let Some(active) = self.general.get_mut(g) {
                *active = false;
            }
        }
    }

    /// Equipped reward days, ascending
    pub fn active_days(&self) -> Vec<u8> {
        let mut days: Vec<u8> = self
            .days
            .iter()
            .filter(|(_, active)| **active)
            .filter_map(|(day, _)| day.parse().ok())
            .collect();
        days.sort_unstable();
        days
    }
}

impl GameState {
    /// Refill the pool with the shuffled catalog and forget the drawn reward
    pub fn init_rewards_for_new_game<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut rewards = reward_catalog();
        rewards.shuffle(rng);
        self.rewards.remaining = rewards;
        self.session.christmas_reward = None;
    }

    /// Draw at most one reward for a question.
    ///
    /// Christmas questions take the front of the pool; an exhausted pool
    /// draws nothing. Non-Christmas questions clear the drawn reward.
    pub fn draw_reward_for(&mut self, question: &Question) -> Option<Reward> {
        let draws = question.is_christmas() && !self.rewards.remaining.is_empty();
        self.session.christmas_reward = if draws {
            Some(self.rewards.remaining.remove(0))
        } else {
            None
        };
        self.session.christmas_reward.clone()
    }

    pub fn reward_summary(&self) -> RewardSummary {
        RewardSummary {
            current: self.session.christmas_reward.clone(),
            next: self.rewards.remaining.first().cloned(),
            remaining: self.rewards.remaining.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::score::tests::question;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_apply_and_revoke_round_trip() {
        let mut rewards = TeamRewards::default();
        let before = rewards.clone();
        let partridge = reward_by_day(1).unwrap();

        rewards.apply(&partridge);
        assert_eq!(rewards.general[&GeneralCategory::Maths], true);
        assert_eq!(rewards.general[&GeneralCategory::Science], true);
        assert_eq!(rewards.days.get("1"), Some(&true));
        assert_eq!(rewards.active_days(), vec![1]);

        rewards.revoke(&partridge);
        assert_eq!(rewards, before);
    }

    #[test]
    fn test_overlapping_rewards_keep_shared_bonus() {
        let mut rewards = TeamRewards::default();
        let partridge = reward_by_day(1).unwrap(); // Maths, Science
        let calling_birds = reward_by_day(4).unwrap(); // Entertainment, Science

        rewards.apply(&partridge);
        let with_partridge = rewards.clone();

        rewards.apply(&calling_birds);
        rewards.revoke(&calling_birds);

        assert_eq!(rewards, with_partridge);
        assert_eq!(rewards.general[&GeneralCategory::Science], true);
        assert_eq!(rewards.general[&GeneralCategory::Entertainment], false);
    }

    #[test]
    fn test_unknown_general_keys_ignored() {
        let mut rewards = TeamRewards::default();
        rewards.general.remove(&GeneralCategory::Maths);
        rewards.apply(&reward_by_day(1).unwrap());
        assert!(!rewards.general.contains_key(&GeneralCategory::Maths));
        assert_eq!(rewards.general[&GeneralCategory::Science], true);
    }

    #[test]
    fn test_new_game_pool_is_full_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut state = GameState::default();
        state.session.christmas_reward = reward_by_day(2);

        state.init_rewards_for_new_game(&mut rng);

        assert!(state.session.christmas_reward.is_none());
        let mut days: Vec<u8> = state.rewards.remaining.iter().map(|r| r.day).collect();
        days.sort_unstable();
        assert_eq!(days, (1..=12).collect::<Vec<u8>>());
    }

    #[test]
    fn test_draws_are_exclusive_and_exhaust() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = GameState::default();
        state.init_rewards_for_new_game(&mut rng);

        let christmas = question("x", "Maths (Algebra)", Difficulty::ChristmasHard);
        let mut drawn = BTreeSet::new();
        for _ in 0..12 {
            let reward = state.draw_reward_for(&christmas).unwrap();
            assert!(drawn.insert(reward.day), "reward drawn twice");
        }
        assert!(state.draw_reward_for(&christmas).is_none());
        assert!(state.session.christmas_reward.is_none());
    }

    #[test]
    fn test_non_christmas_question_draws_nothing() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut state = GameState::default();
        state.init_rewards_for_new_game(&mut rng);

        let normal = question("n", "Maths (Algebra)", Difficulty::Hard);
        assert!(state.draw_reward_for(&normal).is_none());
        assert_eq!(state.rewards.remaining.len(), 12);
    }

    #[test]
    fn test_reward_summary() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = GameState::default();
        state.init_rewards_for_new_game(&mut rng);
        let next = state.rewards.remaining[0].clone();

        let christmas = question("x", "Maths (Algebra)", Difficulty::ChristmasHard);
        state.draw_reward_for(&christmas);

        let summary = state.reward_summary();
        assert_eq!(summary.current, Some(next));
        assert_eq!(summary.remaining, 11);
        assert_eq!(summary.next.as_ref(), state.rewards.remaining.first());
    }
}
