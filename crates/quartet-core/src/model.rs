use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

pub const CATEGORY_SIZE: usize = 4;
pub const NUM_CATEGORIES: usize = 4;
pub const ALLOWED_MISTAKES: u32 = 4;

/// One group of four words sharing a hidden rule.
///
/// The name is display-only; matching is done on the word set. `level` is the
/// puzzle's ordinal difficulty, 0 (easiest) through 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub words: BTreeSet<String>,
    pub level: u8,
}

/// One day's puzzle: four disjoint categories and the flat 16-word list the
/// agent sees, shuffled once at construction from the caller's RNG so a
/// session's word order is reproducible given its seed.
#[derive(Debug, Clone)]
pub struct Puzzle {
    categories: Vec<Category>,
    words: Vec<String>,
}

impl Puzzle {
    pub fn new(categories: Vec<Category>, rng: &mut impl Rng) -> Result<Self, CoreError> {
        if categories.len() != NUM_CATEGORIES {
            return Err(CoreError::InvalidPuzzle(format!(
                "expected {} categories, got {}",
                NUM_CATEGORIES,
                categories.len()
            )));
        }
        for category in &categories {
            if category.words.len() != CATEGORY_SIZE {
                return Err(CoreError::InvalidPuzzle(format!(
                    "category '{}' has {} words, expected {}",
                    category.name,
                    category.words.len(),
                    CATEGORY_SIZE
                )));
            }
            if usize::from(category.level) >= NUM_CATEGORIES {
                return Err(CoreError::InvalidPuzzle(format!(
                    "category '{}' has out-of-range level {}",
                    category.name, category.level
                )));
            }
        }
        let union: BTreeSet<&str> = categories
            .iter()
            .flat_map(|c| c.words.iter().map(String::as_str))
            .collect();
        if union.len() != NUM_CATEGORIES * CATEGORY_SIZE {
            return Err(CoreError::InvalidPuzzle(format!(
                "categories overlap: {} distinct words across {} categories",
                union.len(),
                NUM_CATEGORIES
            )));
        }
        let levels: BTreeSet<u8> = categories.iter().map(|c| c.level).collect();
        if levels.len() != NUM_CATEGORIES {
            return Err(CoreError::InvalidPuzzle(
                "category levels are not distinct".into(),
            ));
        }

        let mut words: Vec<String> = categories
            .iter()
            .flat_map(|c| c.words.iter().cloned())
            .collect();
        words.shuffle(rng);

        Ok(Self { categories, words })
    }

    /// Categories in their declared order (the order glyphs are assigned in).
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The canonical vocabulary in this session's shuffled presentation order.
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// Classification of one guess. Every consumer matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuessOutcome {
    Correct,
    Incorrect,
    ThreeOfFour,
    Invalid,
}

/// A recorded guess: the (validated) word set and how it was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guess {
    pub words: BTreeSet<String>,
    pub outcome: GuessOutcome,
}

/// One ledger line: the per-level outcome of a finished session, keyed by
/// (model, prompt fingerprint, puzzle date). Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub model: String,
    pub prompt_hash: String,
    pub game_date: NaiveDate,
    /// Keys "0".."3", matching the wire format.
    pub levels: BTreeMap<String, bool>,
}

impl EvaluationRecord {
    pub fn new(
        model: impl Into<String>,
        prompt_hash: impl Into<String>,
        game_date: NaiveDate,
        solved_levels: [bool; NUM_CATEGORIES],
    ) -> Self {
        let levels = solved_levels
            .iter()
            .enumerate()
            .map(|(level, solved)| (level.to_string(), *solved))
            .collect();
        Self {
            model: model.into(),
            prompt_hash: prompt_hash.into(),
            game_date,
            levels,
        }
    }

    /// True when all four categories were solved.
    pub fn is_win(&self) -> bool {
        self.levels.values().all(|solved| *solved)
    }

    pub fn solved_count(&self) -> usize {
        self.levels.values().filter(|solved| **solved).count()
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    pub fn category(name: &str, level: u8, words: [&str; 4]) -> Category {
        Category {
            name: name.to_string(),
            words: words.iter().map(|w| (*w).to_string()).collect(),
            level,
        }
    }

    /// The four-category fixture used across the crate's tests. Level 0 is
    /// the planet-starts category from the published 2023-06-12 puzzle.
    pub fn categories() -> Vec<Category> {
        vec![
            category("Starts of planet names", 0, ["EAR", "MAR", "MER", "SAT"]),
            category("Second ___", 1, ["FIDDLE", "GUESS", "NATURE", "WIND"]),
            category(
                "Associated with \"stub\"",
                2,
                ["CIGARETTE", "PENCIL", "TICKET", "TOE"],
            ),
            category("___ Dream", 3, ["AMERICAN", "FEVER", "LUCID", "PIPE"]),
        ]
    }

    pub fn puzzle() -> Puzzle {
        let mut rng = StdRng::seed_from_u64(42);
        Puzzle::new(categories(), &mut rng).expect("fixture puzzle is valid")
    }

    pub fn word_set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }
}
