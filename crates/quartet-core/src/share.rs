//! Renders a finished session as the compact shareable summary.

use chrono::NaiveDate;

use crate::model::{Guess, GuessOutcome, Puzzle};

/// Glyphs by category declaration order.
const CATEGORY_GLYPHS: [&str; 4] = ["\u{1F7E9}", "\u{1F7E8}", "\u{1F7E6}", "\u{1F7EA}"];

/// Date of the first published puzzle, the numbering epoch.
pub fn first_puzzle_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 12).expect("epoch is a valid date")
}

/// `puzzle_number(epoch) == 1`.
pub fn puzzle_number(date: NaiveDate) -> i64 {
    (date - first_puzzle_date()).num_days() + 1
}

/// Header plus one glyph line per non-Invalid guess: four glyphs, one per
/// guessed word in sorted order, colored by the category the word belongs to.
/// Deterministic given the same guess log and puzzle.
pub fn format_game_result(
    model: &str,
    game_date: NaiveDate,
    puzzle: &Puzzle,
    guesses: &[Guess],
) -> String {
    format_game_log(model, game_date, puzzle, guesses, false)
}

/// Like [`format_game_result`], but with `include_invalid` set the summary
/// also renders Invalid guesses (a line per recovered word, so possibly
/// shorter than four glyphs).
pub fn format_game_log(
    model: &str,
    game_date: NaiveDate,
    puzzle: &Puzzle,
    guesses: &[Guess],
    include_invalid: bool,
) -> String {
    let mut out = format!(
        "\u{1F916} Connections ({model}) \nPuzzle #{}\n",
        puzzle_number(game_date)
    );
    for guess in guesses {
        if guess.outcome == GuessOutcome::Invalid && !include_invalid {
            continue;
        }
        for word in &guess.words {
            for (category, glyph) in puzzle.categories().iter().zip(CATEGORY_GLYPHS) {
                if category.words.contains(word) {
                    out.push_str(glyph);
                    break;
                }
            }
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}
