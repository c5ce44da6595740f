//! Pure classification of a validated guess against the puzzle and the
//! session's guess history.

use std::collections::BTreeSet;

use crate::model::{Category, Guess, GuessOutcome};

/// Classifies `guess_set` in fixed order: duplicate of any prior guessed set
/// (whatever its outcome) is Invalid; an exact category match is Correct; a
/// 3-word overlap with a category is ThreeOfFour; anything else is Incorrect.
///
/// Category disjointness guarantees at most one exact match and that the
/// 3-of-4 test cannot fire for two categories at once.
pub fn evaluate_guess(
    categories: &[Category],
    guess_set: &BTreeSet<String>,
    guessed_sets: &[BTreeSet<String>],
) -> Guess {
    if guessed_sets.contains(guess_set) {
        return Guess {
            words: guess_set.clone(),
            outcome: GuessOutcome::Invalid,
        };
    }
    for category in categories {
        if &category.words == guess_set {
            return Guess {
                words: guess_set.clone(),
                outcome: GuessOutcome::Correct,
            };
        }
        if category.words.intersection(guess_set).count() == 3 {
            return Guess {
                words: guess_set.clone(),
                outcome: GuessOutcome::ThreeOfFour,
            };
        }
    }
    Guess {
        words: guess_set.clone(),
        outcome: GuessOutcome::Incorrect,
    }
}
