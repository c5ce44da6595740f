//! Extracts a candidate 4-word guess from free-form agent text.

use std::collections::BTreeSet;

use regex::Regex;

use crate::model::CATEGORY_SIZE;

/// How the agent's reply is expected to carry its guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseProfile {
    /// A fenced block holding a single-key JSON object whose value is the
    /// word array; an optional `<scratchpad>` region is stripped first.
    Fenced,
    /// Every whitespace-delimited token in the reply, punctuation trimmed.
    Loose,
}

/// Outcome of parsing one reply. Pure data; parsing never touches game state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedGuess {
    pub valid: bool,
    pub guess_set: BTreeSet<String>,
    pub reason: String,
}

impl ParsedGuess {
    fn ok(guess_set: BTreeSet<String>) -> Self {
        Self {
            valid: true,
            guess_set,
            reason: String::new(),
        }
    }

    fn rejected(guess_set: BTreeSet<String>, reason: &str) -> Self {
        Self {
            valid: false,
            guess_set,
            reason: reason.to_string(),
        }
    }
}

pub struct GuessParser {
    vocabulary: Vec<String>,
    profile: ParseProfile,
    scratchpad: Regex,
    fence: Regex,
}

impl GuessParser {
    /// `vocabulary` is the puzzle's canonical 16 uppercase words.
    pub fn new(vocabulary: Vec<String>, profile: ParseProfile) -> Self {
        Self {
            vocabulary,
            profile,
            scratchpad: Regex::new(r"(?s)<scratchpad>.*?</scratchpad>")
                .expect("scratchpad pattern is valid"),
            fence: Regex::new(r"(?s)```(.*?)```").expect("fence pattern is valid"),
        }
    }

    pub fn parse(&self, reply: &str) -> ParsedGuess {
        match self.profile {
            ParseProfile::Fenced => self.parse_fenced(reply),
            ParseProfile::Loose => self.parse_loose(reply),
        }
    }

    fn parse_fenced(&self, reply: &str) -> ParsedGuess {
        let stripped = self.scratchpad.replace_all(reply, "");
        let Some(fenced) = self.fence.captures(&stripped) else {
            return ParsedGuess::rejected(
                BTreeSet::new(),
                "Your guess was not between code fences",
            );
        };
        let body = fenced[1].trim();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
            return ParsedGuess::rejected(
                BTreeSet::new(),
                "Your guess JSON was incorrectly formatted",
            );
        };
        // Single-key object; the key is the agent's category name and is
        // ignored, only the word array matters.
        let Some(tokens) = value
            .as_object()
            .and_then(|obj| obj.values().next())
            .and_then(|words| words.as_array())
        else {
            return ParsedGuess::rejected(
                BTreeSet::new(),
                "Your guess JSON was incorrectly formatted",
            );
        };
        let normalized: BTreeSet<String> = tokens
            .iter()
            .filter_map(|t| t.as_str())
            .map(str::to_uppercase)
            .collect();
        self.filter_to_vocabulary(&normalized)
    }

    fn parse_loose(&self, reply: &str) -> ParsedGuess {
        let normalized: BTreeSet<String> = reply
            .split_whitespace()
            .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|token| !token.is_empty())
            .map(str::to_uppercase)
            .collect();
        self.filter_to_vocabulary(&normalized)
    }

    fn filter_to_vocabulary(&self, candidates: &BTreeSet<String>) -> ParsedGuess {
        let guess_set: BTreeSet<String> = self
            .vocabulary
            .iter()
            .filter(|word| candidates.contains(word.as_str()))
            .cloned()
            .collect();
        if guess_set.len() != CATEGORY_SIZE {
            return ParsedGuess::rejected(guess_set, "Your guess must contain 4 words");
        }
        ParsedGuess::ok(guess_set)
    }
}
