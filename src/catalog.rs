//! Fixed game tables: category groupings, the reward catalog and point values.

use crate::types::{Difficulty, GeneralCategory, Reward};

/// General category -> the specific bank categories it covers
pub const GENERAL_CATEGORIES: &[(GeneralCategory, &[&str])] = &[
    (
        GeneralCategory::Maths,
        &[
            "Maths (Geometry)",
            "Maths (Algebra)",
            "Maths (Arithmetic)",
            "Maths (Logic, Probability)",
        ],
    ),
    (
        GeneralCategory::Science,
        &[
            "Science (Physics)",
            "Science (Chemistry)",
            "Science (Biology)",
            "Science (Astronomy, Quantum Mechanics)",
        ],
    ),
    (
        GeneralCategory::History,
        &[
            "History (Political)",
            "History (Art)",
            "History (Cultural)",
            "History (Social)",
        ],
    ),
    (
        GeneralCategory::Entertainment,
        &[
            "Entertainment (Video Games)",
            "Entertainment (Music)",
            "Entertainment (Film)",
            "Entertainment (Television)",
        ],
    ),
    (
        GeneralCategory::PopCulture,
        &[
            "Pop Culture (Fashion)",
            "Pop Culture (Current Celebrities)",
            "Pop Culture (Sports)",
            "Pop Culture (Social Media, Trends)",
        ],
    ),
    (
        GeneralCategory::WorldCulture,
        &[
            "World and Culture (Geography, Language)",
            "World and Culture (Famous People, Landmarks)",
            "World and Culture (Philippines)",
            "World and Culture (Australia)",
        ],
    ),
    (
        GeneralCategory::Mythology,
        &[
            "Mythology (Christian)",
            "Mythology (Greek and Roman)",
            "Mythology (Egyptian)",
            "Mythology (Norse)",
        ],
    ),
];

/// Look up the general category of a specific bank category
pub fn general_category_of(category: &str) -> Option<GeneralCategory> {
    GENERAL_CATEGORIES
        .iter()
        .find(|(_, specifics)| specifics.contains(&category))
        .map(|(general, _)| *general)
}

/// Points per difficulty band. Christmas questions are always worth 1.
pub fn points_for(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Medium => 1,
        Difficulty::Hard => 2,
        Difficulty::VeryHard => 3,
        Difficulty::ChristmasHard => 1,
    }
}

struct RewardSpec {
    day: u8,
    name: &'static str,
    general: [GeneralCategory; 2],
    slug: &'static str,
}

const fn reward(
    day: u8,
    name: &'static str,
    general: [GeneralCategory; 2],
    slug: &'static str,
) -> RewardSpec {
    RewardSpec {
        day,
        name,
        general,
        slug,
    }
}

const REWARD_SPECS: [RewardSpec; 12] = {
    use GeneralCategory::*;
    [
        reward(1, "Partridge", [Maths, Science], "partridge"),
        reward(2, "Turtle Doves", [History, WorldCulture], "turtle-doves"),
        reward(3, "French Hens", [PopCulture, Mythology], "french-hens"),
        reward(4, "Calling Birds", [Entertainment, Science], "calling-birds"),
        reward(5, "Golden Rings", [Maths, History], "golden-rings"),
        reward(6, "Geese", [WorldCulture, Science], "geese"),
        reward(7, "Swans", [Mythology, History], "swans"),
        reward(8, "Maids", [Entertainment, WorldCulture], "maids"),
        reward(9, "Dancing Ladies", [Entertainment, PopCulture], "ladies"),
        reward(10, "Leaping Lords", [Maths, PopCulture], "lords"),
        reward(11, "Pipers", [Science, Mythology], "pipers"),
        reward(12, "Drummers", [WorldCulture, PopCulture], "drummers"),
    ]
};

/// Number of rewards available per game
pub const REWARD_COUNT: usize = REWARD_SPECS.len();

impl RewardSpec {
    fn to_reward(&self) -> Reward {
        Reward {
            day: self.day,
            name: self.name.to_string(),
            general: self.general.to_vec(),
        }
    }
}

/// The full twelve-day catalog in day order
pub fn reward_catalog() -> Vec<Reward> {
    REWARD_SPECS.iter().map(RewardSpec::to_reward).collect()
}

pub fn reward_by_day(day: u8) -> Option<Reward> {
    REWARD_SPECS
        .iter()
        .find(|r| r.day == day)
        .map(RewardSpec::to_reward)
}

/// Icon path shown next to a team that has the reward equipped
pub fn reward_icon_path(day: u8) -> String {
    let day = day.clamp(1, 99);
    let slug = REWARD_SPECS
        .iter()
        .find(|r| r.day == day)
        .map(|r| r.slug.to_string())
        .unwrap_or_else(|| format!("day-{:02}", day));
    format!("img/buffs/day-{:02}-{}.svg", day, slug)
}

impl Reward {
    /// Two-line tooltip: name/day, then the categories it boosts
    pub fn tooltip(&self) -> String {
        let categories = self
            .general
            .iter()
            .map(|g| g.label())
            .collect::<Vec<_>>()
            .join(", ");
        let categories = if categories.is_empty() {
            "-".to_string()
        } else {
            categories
        };
        format!(
            "{} (Day {})\n+1 bonus for: {}",
            self.name, self.day, categories
        )
    }
}
