//! Question bank loading, validation and per-category session configuration.
//!
//! A conforming bank groups into categories of exactly 10 questions:
//! 2 medium, 3 hard, 3 very-hard and 2 christmas-hard. Violations are
//! collected as readable messages; whether they are fatal is a config switch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::error::BankError;
use crate::sanitize::{coerce_string, sanitize_media, truthy};
use crate::types::{Difficulty, Question};

/// Questions expected per category in a conforming bank
pub const QUESTIONS_PER_CATEGORY: usize = 10;

/// Upper bound for a category's requested quantity
pub const MAX_QUANTITY: u32 = 10;

/// Required count per difficulty band within one category
pub const REQUIRED_DISTRIBUTION: [(Difficulty, usize); 4] = [
    (Difficulty::Medium, 2),
    (Difficulty::Hard, 3),
    (Difficulty::VeryHard, 3),
    (Difficulty::ChristmasHard, 2),
];

/// A bank record as stored in the JSON file.
///
/// Records are read field by field with the sanitizer's coercions, so a
/// missing or wrong-typed field shows up as a validation message rather
/// than a parse failure of the whole bank.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BankQuestion {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub host_notes: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub difficulty: String,
    pub category: String,
    pub christmas: bool,
    /// Host-adjudicated rule for numeric questions (display only)
    pub numeric_rule: Option<Value>,
    pub media: Option<Value>,
}

impl BankQuestion {
    /// Read one record; a non-object yields an empty record
    pub fn from_value(raw: &Value) -> Self {
        let text = |field: &str| {
            if truthy(raw.get(field)) {
                coerce_string(raw.get(field)).unwrap_or_default()
            } else {
                String::new()
            }
        };
        let annotation = |field: &str| raw.get(field).filter(|v| !v.is_null()).cloned();

        Self {
            id: text("id"),
            question: text("question"),
            answer: text("answer"),
            host_notes: text("hostNotes"),
            kind: text("type"),
            difficulty: text("difficulty"),
            category: text("category"),
            christmas: truthy(raw.get("christmas")),
            numeric_rule: annotation("numericRule"),
            media: annotation("media"),
        }
    }

    /// Project the record onto the trimmed queue representation
    pub fn to_question(&self) -> Question {
        Question {
            id: if self.id.is_empty() {
                ulid::Ulid::new().to_string()
            } else {
                self.id.clone()
            },
            category: self.category.clone(),
            difficulty: Difficulty::parse_lenient(&self.difficulty),
            question: self.question.clone(),
            answer: self.answer.clone(),
            christmas: self.christmas,
            host_notes: self.host_notes.clone(),
            media: self.media.as_ref().and_then(sanitize_media),
        }
    }
}

/// Parse bank JSON text.
///
/// Only unparsable JSON or a non-array is an error. An empty array loads and
/// is reported by [`validate_bank`].
pub fn parse_bank(text: &str) -> Result<Vec<BankQuestion>, BankError> {
    let value: Value = serde_json::from_str(text)?;
    let records = value.as_array().ok_or(BankError::NotArray)?;
    Ok(records.iter().map(BankQuestion::from_value).collect())
}

/// Read and parse a bank file
pub async fn load_bank(path: &Path) -> Result<Vec<BankQuestion>, BankError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BankError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let bank = parse_bank(&text)?;
    tracing::info!("Loaded {} questions from {}", bank.len(), path.display());
    Ok(bank)
}

/// Distinct categories in order of first appearance
pub fn categories(bank: &[BankQuestion]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for q in bank {
        if !out.contains(&q.category) {
            out.push(q.category.clone());
        }
    }
    out
}

/// Collect every shape and distribution violation in the bank
pub fn validate_bank(bank: &[BankQuestion]) -> Vec<String> {
    let mut errors = Vec::new();

    if bank.is_empty() {
        errors.push("Question bank is empty or not an array.".to_string());
        return errors;
    }

    for category in categories(bank) {
        let questions: Vec<&BankQuestion> =
            bank.iter().filter(|q| q.category == category).collect();
        let mut counts = [0usize; 4];

        for q in &questions {
            if q.id.is_empty() {
                errors.push(format!("[{}] Question missing id.", category));
            }
            if q.question.is_empty() {
                errors.push(format!("[{}] Question text missing.", category));
            }
            if q.answer.is_empty() {
                errors.push(format!("[{}] Answer missing.", category));
            }
            if q.host_notes.is_empty() {
                errors.push(format!("[{}] Host notes missing.", category));
            }
            if q.kind.is_empty() {
                errors.push(format!("[{}] Question type missing.", category));
            }

            let Some(difficulty) = Difficulty::parse(&q.difficulty) else {
                errors.push(format!(
                    "[{}] Invalid difficulty \"{}\".",
                    category, q.difficulty
                ));
                continue;
            };

            if let Some(slot) = REQUIRED_DISTRIBUTION
                .iter()
                .position(|(d, _)| *d == difficulty)
            {
                counts[slot] += 1;
            }

            if difficulty == Difficulty::ChristmasHard && !q.christmas {
                errors.push(format!(
                    "[{}] Christmas-hard question must have christmas=true.",
                    category
                ));
            }
            if q.christmas && difficulty != Difficulty::ChristmasHard {
                errors.push(format!(
                    "[{}] christmas=true requires difficulty=christmas-hard.",
                    category
                ));
            }

            if q.kind == "numeric" && q.numeric_rule.is_none() {
                errors.push(format!(
                    "[{}] Numeric question missing numericRule.",
                    category
                ));
            }

            if q.kind == "media" {
                match &q.media {
                    None => errors.push(format!(
                        "[{}] Media question missing media object.",
                        category
                    )),
                    Some(media) => {
                        let has = |field: &str| {
                            media
                                .get(field)
                                .and_then(|v| v.as_str())
                                .is_some_and(|s| !s.is_empty())
                        };
                        if !has("type") || !has("src") {
                            errors.push(format!("[{}] Media must have type and src.", category));
                        }
                    }
                }
            }
        }

        for ((difficulty, required), found) in REQUIRED_DISTRIBUTION.iter().zip(counts) {
            if found != *required {
                errors.push(format!(
                    "[{}] Expected {} {} questions, found {}.",
                    category,
                    required,
                    difficulty.as_str(),
                    found
                ));
            }
        }

        if questions.len() != QUESTIONS_PER_CATEGORY {
            errors.push(format!(
                "[{}] Expected {} questions, found {}.",
                category,
                QUESTIONS_PER_CATEGORY,
                questions.len()
            ));
        }
    }

    errors
}

/// Validate and log; in strict mode any violation rejects the bank
pub fn check_bank(bank: &[BankQuestion], strict: bool) -> Result<Vec<String>, BankError> {
    let errors = validate_bank(bank);
    if errors.is_empty() {
        return Ok(errors);
    }

    for e in &errors {
        tracing::warn!("Question bank: {}", e);
    }

    if strict {
        tracing::error!("Question bank rejected ({} errors)", errors.len());
        Err(BankError::Invalid(errors))
    } else {
        tracing::warn!(
            "Question bank has {} validation errors, continuing anyway",
            errors.len()
        );
        Ok(errors)
    }
}

// =========================================================================
// Category configuration
// =========================================================================

/// Named quantity presets, alternating min/max across categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Short,
    Standard,
    Long,
}

impl Preset {
    /// (min, max) quantity per category
    pub fn range(self) -> (u32, u32) {
        match self {
            Preset::Short => (1, 2),
            Preset::Standard => (2, 3),
            Preset::Long => (3, 4),
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(Preset::Short),
            "standard" => Ok(Preset::Standard),
            "long" => Ok(Preset::Long),
            other => Err(format!("Unknown preset: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryQuantity {
    pub category: String,
    pub quantity: u32,
}

/// Requested quantity per category, in bank order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoryConfig {
    pub entries: Vec<CategoryQuantity>,
}

impl CategoryConfig {
    /// Every category of the bank at the full quantity
    pub fn from_categories(categories: Vec<String>) -> Self {
        Self {
            entries: categories
                .into_iter()
                .map(|category| CategoryQuantity {
                    category,
                    quantity: MAX_QUANTITY,
                })
                .collect(),
        }
    }

    pub fn from_bank(bank: &[BankQuestion]) -> Self {
        Self::from_categories(categories(bank))
    }

    /// Set one category's quantity, clamped to `[0, 10]`.
    /// Returns false for a category not in the bank.
    pub fn set_quantity(&mut self, category: &str, quantity: i64) -> bool {
        match self.entries.iter_mut().find(|e| e.category == category) {
            Some(entry) => {
                entry.quantity = quantity.clamp(0, i64::from(MAX_QUANTITY)) as u32;
                true
            }
            None => false,
        }
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        let (min, max) = preset.range();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.quantity = if i % 2 == 0 { min } else { max };
        }
    }

    pub fn quantity(&self, category: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.quantity)
    }

    /// Total number of questions requested
    pub fn total(&self) -> u32 {
        self.entries.iter().map(|e| e.quantity).sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A conforming category: 2 medium, 3 hard, 3 very-hard, 2 christmas-hard
    pub(crate) fn conforming_category(category: &str) -> Vec<BankQuestion> {
        let bands = [
            ("medium", 2, false),
            ("hard", 3, false),
            ("very-hard", 3, false),
            ("christmas-hard", 2, true),
        ];
        let mut out = Vec::new();
        for (difficulty, count, christmas) in bands {
            for i in 0..count {
                out.push(BankQuestion {
                    id: format!("{}-{}-{}", category, difficulty, i),
                    question: format!("{} {} question {}", category, difficulty, i),
                    answer: "answer".to_string(),
                    host_notes: "notes".to_string(),
                    kind: "text".to_string(),
                    difficulty: difficulty.to_string(),
                    category: category.to_string(),
                    christmas,
                    numeric_rule: None,
                    media: None,
                });
            }
        }
        out
    }

    #[test]
    fn test_conforming_bank_has_no_errors() {
        let mut bank = conforming_category("Science (Physics)");
        bank.extend(conforming_category("History (Art)"));
        assert!(validate_bank(&bank).is_empty());
    }

    #[test]
    fn test_empty_bank() {
        let errors = validate_bank(&[]);
        assert_eq!(errors, vec!["Question bank is empty or not an array."]);
    }

    #[test]
    fn test_distribution_errors() {
        let mut bank = conforming_category("Maths (Algebra)");
        bank.pop();
        let errors = validate_bank(&bank);
        assert!(errors.contains(
            &"[Maths (Algebra)] Expected 2 christmas-hard questions, found 1.".to_string()
        ));
        assert!(errors.contains(&"[Maths (Algebra)] Expected 10 questions, found 9.".to_string()));
    }

    #[test]
    fn test_record_errors() {
        let mut bank = conforming_category("Maths (Algebra)");
        bank[0].host_notes.clear();
        bank[1].kind = "numeric".to_string();
        bank[2].kind = "media".to_string();
        bank[2].media = Some(serde_json::json!({"type": "audio"}));
        bank[3].christmas = true;
        bank[4].difficulty = "trivial".to_string();

        let errors = validate_bank(&bank);
        assert!(errors.contains(&"[Maths (Algebra)] Host notes missing.".to_string()));
        assert!(errors
            .contains(&"[Maths (Algebra)] Numeric question missing numericRule.".to_string()));
        assert!(errors.contains(&"[Maths (Algebra)] Media must have type and src.".to_string()));
        assert!(errors.contains(
            &"[Maths (Algebra)] christmas=true requires difficulty=christmas-hard.".to_string()
        ));
        assert!(errors.contains(&"[Maths (Algebra)] Invalid difficulty \"trivial\".".to_string()));
    }

    #[test]
    fn test_check_bank_strictness() {
        let mut bank = conforming_category("Maths (Algebra)");
        bank.truncate(5);

        let advisory = check_bank(&bank, false).unwrap();
        assert!(!advisory.is_empty());

        match check_bank(&bank, true) {
            Err(BankError::Invalid(errors)) => assert_eq!(errors, advisory),
            other => panic!("Expected strict rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_bank() {
        let bank = parse_bank(
            r#"[{"id": "q1", "question": "Q", "answer": "A", "hostNotes": "N",
                 "type": "media", "difficulty": "hard", "category": "Science (Physics)",
                 "media": {"type": "image", "src": "img.png"}, "unknown": 1}]"#,
        )
        .unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].kind, "media");

        let q = bank[0].to_question();
        assert_eq!(q.difficulty, Difficulty::Hard);
        assert!(q.media.is_some());

        assert!(matches!(parse_bank("{}"), Err(BankError::NotArray)));
        assert!(matches!(parse_bank("not json"), Err(BankError::Parse(_))));
    }

    #[test]
    fn test_wrong_typed_fields_become_validation_messages() {
        let bank = parse_bank(
            r#"[{"id": 101, "question": "Q", "answer": 7, "hostNotes": null,
                 "type": "text", "difficulty": "hard", "category": "Science (Physics)",
                 "christmas": "no thanks", "numericRule": null},
                "not a record"]"#,
        )
        .unwrap();
        assert_eq!(bank.len(), 2);
        assert_eq!(bank[0].id, "101");
        assert_eq!(bank[0].answer, "7");
        assert!(bank[0].host_notes.is_empty());
        assert!(bank[0].christmas);
        assert!(bank[0].numeric_rule.is_none());
        assert!(bank[1].id.is_empty());

        let errors = check_bank(&bank, false).unwrap();
        assert!(errors.contains(&"[Science (Physics)] Host notes missing.".to_string()));
        assert!(errors.contains(
            &"[Science (Physics)] christmas=true requires difficulty=christmas-hard.".to_string()
        ));
        assert!(errors.contains(&"[] Question missing id.".to_string()));
    }

    #[test]
    fn test_empty_bank_is_advisory() {
        let bank = parse_bank("[]").unwrap();
        assert!(bank.is_empty());

        let errors = check_bank(&bank, false).unwrap();
        assert_eq!(errors, vec!["Question bank is empty or not an array."]);
        assert!(matches!(check_bank(&bank, true), Err(BankError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_load_bank_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_bank(&dir.path().join("missing.json")).await;
        assert!(matches!(result, Err(BankError::Io { .. })));
    }

    #[test]
    fn test_category_config() {
        let mut bank = conforming_category("A");
        bank.extend(conforming_category("B"));
        bank.extend(conforming_category("C"));

        let mut config = CategoryConfig::from_bank(&bank);
        assert_eq!(config.total(), 30);

        config.apply_preset(Preset::Standard);
        assert_eq!(config.quantity("A"), Some(2));
        assert_eq!(config.quantity("B"), Some(3));
        assert_eq!(config.quantity("C"), Some(2));

        assert!(config.set_quantity("B", 42));
        assert_eq!(config.quantity("B"), Some(10));
        assert!(config.set_quantity("B", -1));
        assert_eq!(config.quantity("B"), Some(0));
        assert!(!config.set_quantity("Z", 1));
    }

    #[test]
    fn test_preset_parse() {
        assert_eq!("long".parse::<Preset>(), Ok(Preset::Long));
        assert!("epic".parse::<Preset>().is_err());
    }
}
