//! The turn loop: renders feedback prompts, consumes agent replies, and
//! drives the session state to a terminal outcome.

use std::collections::BTreeSet;

use crate::evaluator::evaluate_guess;
use crate::model::{Guess, GuessOutcome, Puzzle, ALLOWED_MISTAKES, NUM_CATEGORIES};
use crate::parser::{GuessParser, ParseProfile};
use crate::providers::llm::Conversation;

/// One engine, two rulesets. `strict` expects fenced-JSON guesses and cuts a
/// session off after repeated unparsable replies; `loose` scavenges plain
/// tokens and never gives up on parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RulesProfile {
    pub parse: ParseProfile,
    pub consecutive_invalid_cap: Option<u32>,
}

impl RulesProfile {
    pub fn strict() -> Self {
        Self {
            parse: ParseProfile::Fenced,
            consecutive_invalid_cap: Some(3),
        }
    }

    pub fn loose() -> Self {
        Self {
            parse: ParseProfile::Loose,
            consecutive_invalid_cap: None,
        }
    }
}

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    /// The mistake budget ran out.
    LostMistakes,
    /// Too many consecutive invalid replies (strict profile only).
    LostInvalid,
}

/// Per-session counters and the ordered guess log. Owned by exactly one
/// [`GameSession`] and mutated only through `add_guess`; read-only once the
/// session terminates.
#[derive(Debug)]
pub struct GameState {
    puzzle: Puzzle,
    remaining_mistakes: u32,
    solved: u32,
    guesses: Vec<Guess>,
    consecutive_invalid: u32,
}

impl GameState {
    pub fn new(puzzle: Puzzle) -> Self {
        Self {
            puzzle,
            remaining_mistakes: ALLOWED_MISTAKES,
            solved: 0,
            guesses: Vec::new(),
            consecutive_invalid: 0,
        }
    }

    /// Correct guesses consume no budget and reset the invalid streak;
    /// Invalid guesses consume no budget and extend it; everything else
    /// consumes exactly one unit of budget.
    pub fn add_guess(&mut self, guess: Guess) {
        match guess.outcome {
            GuessOutcome::Correct => {
                self.solved += 1;
                self.consecutive_invalid = 0;
            }
            GuessOutcome::Invalid => {
                self.consecutive_invalid += 1;
            }
            GuessOutcome::Incorrect | GuessOutcome::ThreeOfFour => {
                self.remaining_mistakes -= 1;
                self.consecutive_invalid = 0;
            }
        }
        self.guesses.push(guess);
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn remaining_mistakes(&self) -> u32 {
        self.remaining_mistakes
    }

    pub fn solved(&self) -> u32 {
        self.solved
    }

    pub fn consecutive_invalid(&self) -> u32 {
        self.consecutive_invalid
    }

    pub fn guesses(&self) -> &[Guess] {
        &self.guesses
    }

    /// Every guessed set regardless of outcome, so duplicate detection does
    /// not depend on how a set was classified the first time.
    pub fn guessed_sets(&self) -> Vec<BTreeSet<String>> {
        self.guesses.iter().map(|g| g.words.clone()).collect()
    }

    pub fn correct_guesses(&self) -> impl Iterator<Item = &Guess> {
        self.guesses
            .iter()
            .filter(|g| g.outcome == GuessOutcome::Correct)
    }

    /// True if any of `words` already belongs to a correctly guessed
    /// category.
    pub fn any_word_already_solved(&self, words: &BTreeSet<String>) -> bool {
        self.correct_guesses()
            .any(|g| !g.words.is_disjoint(words))
    }

    /// Which difficulty levels were solved, for the evaluation record.
    pub fn solved_levels(&self) -> [bool; NUM_CATEGORIES] {
        let mut levels = [false; NUM_CATEGORIES];
        for guess in self.correct_guesses() {
            for category in self.puzzle.categories() {
                if category.words == guess.words {
                    levels[usize::from(category.level)] = true;
                    break;
                }
            }
        }
        levels
    }
}

/// Drives one game to termination over a [`Conversation`].
pub struct GameSession {
    state: GameState,
    parser: GuessParser,
    profile: RulesProfile,
    next_prompt: String,
}

impl GameSession {
    /// `initial_prompt` is the rendered instruction template including this
    /// session's shuffled word list.
    pub fn new(puzzle: Puzzle, profile: RulesProfile, initial_prompt: String) -> Self {
        let parser = GuessParser::new(puzzle.words().to_vec(), profile.parse);
        Self {
            state: GameState::new(puzzle),
            parser,
            profile,
            next_prompt: initial_prompt,
        }
    }

    /// Runs turns until a terminal condition holds. Only provider failures
    /// surface as errors; lost games are ordinary outcomes.
    pub async fn play(&mut self, conversation: &mut dyn Conversation) -> anyhow::Result<GameOutcome> {
        loop {
            if let Some(outcome) = self.outcome() {
                tracing::info!(
                    ?outcome,
                    turns = self.state.guesses().len(),
                    solved = self.state.solved(),
                    "game over"
                );
                return Ok(outcome);
            }
            self.turn(conversation).await?;
        }
    }

    /// The terminal outcome, or None while the game is still in progress.
    pub fn outcome(&self) -> Option<GameOutcome> {
        if self.state.solved() as usize == NUM_CATEGORIES {
            return Some(GameOutcome::Won);
        }
        if let Some(cap) = self.profile.consecutive_invalid_cap {
            if self.state.consecutive_invalid() >= cap {
                return Some(GameOutcome::LostInvalid);
            }
        }
        if self.state.remaining_mistakes() == 0 {
            return Some(GameOutcome::LostMistakes);
        }
        None
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn into_state(self) -> GameState {
        self.state
    }

    async fn turn(&mut self, conversation: &mut dyn Conversation) -> anyhow::Result<()> {
        let reply = conversation.send(&self.next_prompt).await?;
        tracing::debug!(reply_len = reply.len(), "agent replied");

        let parsed = self.parser.parse(&reply);
        if !parsed.valid {
            self.next_prompt = format!("Your guess was invalid. {}.", parsed.reason);
            self.state.add_guess(Guess {
                words: parsed.guess_set,
                outcome: GuessOutcome::Invalid,
            });
            return Ok(());
        }

        // A word from an already-solved category can never form a new valid
        // group, so the evaluator is not consulted and no budget is spent.
        if self.state.any_word_already_solved(&parsed.guess_set) {
            self.next_prompt =
                "Your guess was invalid. You cannot use a word in more than one category."
                    .to_string();
            self.state.add_guess(Guess {
                words: parsed.guess_set,
                outcome: GuessOutcome::Invalid,
            });
            return Ok(());
        }

        let guess = evaluate_guess(
            self.state.puzzle().categories(),
            &parsed.guess_set,
            &self.state.guessed_sets(),
        );
        let outcome = guess.outcome;
        self.state.add_guess(guess);
        self.next_prompt = self.feedback(outcome);
        Ok(())
    }

    fn feedback(&self, outcome: GuessOutcome) -> String {
        let mut text = match outcome {
            GuessOutcome::Correct => {
                format!("Correct! You've guessed {}/4 groups.", self.state.solved())
            }
            GuessOutcome::ThreeOfFour => {
                "Incorrect, but three out of four words belong to the same category.".to_string()
            }
            GuessOutcome::Incorrect => "Incorrect".to_string(),
            GuessOutcome::Invalid => "You have already guessed this group of words".to_string(),
        };

        let remaining = self.state.remaining_mistakes();
        let noun = if remaining == 1 { "guess" } else { "guesses" };
        text.push_str(&format!(" You have {remaining} {noun} remaining."));

        let solved: Vec<String> = self
            .state
            .correct_guesses()
            .map(|g| {
                let words: Vec<&str> = g.words.iter().map(String::as_str).collect();
                format!("[{}]", words.join(", "))
            })
            .collect();
        if !solved.is_empty() {
            text.push_str("\nCorrect guesses so far: ");
            text.push_str(&solved.join(" "));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::{puzzle, word_set};
    use crate::providers::llm::fake::FakeConversation;

    fn fenced(words: [&str; 4]) -> String {
        format!(
            "```{{\"group\": [\"{}\", \"{}\", \"{}\", \"{}\"]}}```",
            words[0], words[1], words[2], words[3]
        )
    }

    fn session() -> GameSession {
        GameSession::new(puzzle(), RulesProfile::strict(), "start".to_string())
    }

    #[tokio::test]
    async fn four_correct_guesses_win_without_spending_budget() {
        let mut conversation = FakeConversation::scripted(vec![
            fenced(["EAR", "MAR", "MER", "SAT"]),
            fenced(["FIDDLE", "GUESS", "NATURE", "WIND"]),
            fenced(["CIGARETTE", "PENCIL", "TICKET", "TOE"]),
            fenced(["AMERICAN", "FEVER", "LUCID", "PIPE"]),
        ]);
        let mut session = session();
        let outcome = session.play(&mut conversation).await.expect("plays out");
        assert_eq!(outcome, GameOutcome::Won);
        assert_eq!(session.state().solved(), 4);
        assert_eq!(session.state().remaining_mistakes(), 4);
        // Turn 1 sends the initial prompt untouched.
        assert_eq!(conversation.sent[0], "start");
        assert!(conversation.sent[1].starts_with("Correct! You've guessed 1/4 groups."));
    }

    #[tokio::test]
    async fn correct_then_unknown_word_then_resubmit_is_never_recounted() {
        // The §8-style scenario: solve planets, then guess with a word that
        // is not in the vocabulary, then resubmit the solved set.
        let mut conversation = FakeConversation::scripted(vec![
            fenced(["EAR", "MAR", "MER", "SAT"]),
            fenced(["EAR", "MAR", "MER", "ZZZ"]),
            fenced(["EAR", "MAR", "MER", "SAT"]),
            fenced(["FIDDLE", "GUESS", "NATURE", "WIND"]),
            fenced(["CIGARETTE", "PENCIL", "TICKET", "TOE"]),
            fenced(["AMERICAN", "FEVER", "LUCID", "PIPE"]),
        ]);
        let mut session = session();
        let outcome = session.play(&mut conversation).await.expect("plays out");
        assert_eq!(outcome, GameOutcome::Won);

        let outcomes: Vec<GuessOutcome> =
            session.state().guesses().iter().map(|g| g.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                GuessOutcome::Correct,
                GuessOutcome::Invalid,
                GuessOutcome::Invalid,
                GuessOutcome::Correct,
                GuessOutcome::Correct,
                GuessOutcome::Correct,
            ]
        );
        assert_eq!(session.state().remaining_mistakes(), 4);
        // The vocabulary-filtered guess gets the size reason...
        assert!(conversation.sent[2].contains("Your guess must contain 4 words"));
        // ...and the resubmission trips the solved-category guard.
        assert!(conversation.sent[3].contains("You cannot use a word in more than one category"));
    }

    #[tokio::test]
    async fn duplicate_incorrect_guess_is_invalid_not_double_counted() {
        let wrong = ["EAR", "MAR", "FIDDLE", "GUESS"];
        let mut conversation = FakeConversation::scripted(vec![
            fenced(wrong),
            fenced(wrong),
            fenced(["EAR", "MAR", "MER", "SAT"]),
            fenced(["FIDDLE", "GUESS", "NATURE", "WIND"]),
            fenced(["CIGARETTE", "PENCIL", "TICKET", "TOE"]),
            fenced(["AMERICAN", "FEVER", "LUCID", "PIPE"]),
        ]);
        let mut session = session();
        let outcome = session.play(&mut conversation).await.expect("plays out");
        assert_eq!(outcome, GameOutcome::Won);
        // One mistake for the wrong guess, none for its duplicate.
        assert_eq!(session.state().remaining_mistakes(), 3);
        assert!(conversation.sent[2].starts_with("You have already guessed this group of words"));
    }

    #[tokio::test]
    async fn mistake_budget_exhaustion_loses() {
        let mut conversation = FakeConversation::scripted(vec![
            fenced(["EAR", "MAR", "FIDDLE", "GUESS"]),
            fenced(["EAR", "MAR", "FIDDLE", "WIND"]),
            fenced(["EAR", "MAR", "NATURE", "WIND"]),
            fenced(["EAR", "GUESS", "NATURE", "WIND"]),
        ]);
        let mut session = session();
        let outcome = session.play(&mut conversation).await.expect("plays out");
        assert_eq!(outcome, GameOutcome::LostMistakes);
        assert_eq!(session.state().remaining_mistakes(), 0);
        assert_eq!(session.state().guesses().len(), 4);
    }

    #[tokio::test]
    async fn three_of_four_consumes_budget_and_says_so() {
        let mut conversation =
            FakeConversation::scripted(vec![fenced(["EAR", "MAR", "MER", "WIND"])]);
        let mut session = session();
        session.turn(&mut conversation).await.expect("one turn");
        assert_eq!(session.state().remaining_mistakes(), 3);
        assert!(session
            .next_prompt
            .starts_with("Incorrect, but three out of four words belong to the same category."));
        assert!(session.next_prompt.contains("You have 3 guesses remaining."));
    }

    #[tokio::test]
    async fn three_consecutive_invalid_replies_lose_under_strict_rules() {
        let mut conversation = FakeConversation::scripted(vec![
            "no fences here".to_string(),
            "```not json```".to_string(),
            "still rambling".to_string(),
        ]);
        let mut session = session();
        let outcome = session.play(&mut conversation).await.expect("plays out");
        assert_eq!(outcome, GameOutcome::LostInvalid);
        assert_eq!(session.state().remaining_mistakes(), 4);
        assert!(conversation.sent[1]
            .contains("Your guess was invalid. Your guess was not between code fences."));
        assert!(conversation.sent[2]
            .contains("Your guess was invalid. Your guess JSON was incorrectly formatted."));
    }

    #[tokio::test]
    async fn correct_guess_resets_the_invalid_streak() {
        let mut conversation = FakeConversation::scripted(vec![
            "garbage".to_string(),
            "garbage".to_string(),
            fenced(["EAR", "MAR", "MER", "SAT"]),
            "garbage".to_string(),
            "garbage".to_string(),
            "garbage".to_string(),
        ]);
        let mut session = session();
        let outcome = session.play(&mut conversation).await.expect("plays out");
        // Two invalids, a reset, then three more to trip the cap.
        assert_eq!(outcome, GameOutcome::LostInvalid);
        assert_eq!(session.state().solved(), 1);
        assert_eq!(session.state().guesses().len(), 6);
    }

    #[tokio::test]
    async fn loose_profile_has_no_invalid_cap() {
        let mut conversation = FakeConversation::scripted(vec![
            "hmm, thinking".to_string(),
            "still thinking".to_string(),
            "more thinking".to_string(),
            "what about ear mar mer sat".to_string(),
            "next: fiddle guess nature wind".to_string(),
            "then cigarette pencil ticket toe".to_string(),
            "finally american fever lucid pipe".to_string(),
        ]);
        let mut session = GameSession::new(puzzle(), RulesProfile::loose(), "start".to_string());
        let outcome = session.play(&mut conversation).await.expect("plays out");
        assert_eq!(outcome, GameOutcome::Won);
        assert_eq!(session.state().consecutive_invalid(), 0);
    }

    #[tokio::test]
    async fn singular_budget_wording_at_one_remaining() {
        let mut conversation = FakeConversation::scripted(vec![
            fenced(["EAR", "MAR", "FIDDLE", "GUESS"]),
            fenced(["EAR", "MAR", "FIDDLE", "WIND"]),
            fenced(["EAR", "MAR", "NATURE", "WIND"]),
        ]);
        let mut session = session();
        for _ in 0..3 {
            session.turn(&mut conversation).await.expect("turn");
        }
        assert!(session.next_prompt.contains("You have 1 guess remaining."));
    }

    #[tokio::test]
    async fn feedback_lists_solved_categories() {
        let mut conversation = FakeConversation::scripted(vec![
            fenced(["EAR", "MAR", "MER", "SAT"]),
            fenced(["FIDDLE", "GUESS", "NATURE", "TOE"]),
        ]);
        let mut session = session();
        session.turn(&mut conversation).await.expect("turn 1");
        session.turn(&mut conversation).await.expect("turn 2");
        assert!(session
            .next_prompt
            .contains("Correct guesses so far: [EAR, MAR, MER, SAT]"));
    }

    #[test]
    fn solved_levels_map_back_to_category_levels() {
        let mut state = GameState::new(puzzle());
        state.add_guess(Guess {
            words: word_set(&["FIDDLE", "GUESS", "NATURE", "WIND"]),
            outcome: GuessOutcome::Correct,
        });
        assert_eq!(state.solved_levels(), [false, true, false, false]);
    }
}
