//! The instruction template sent on turn 1, and its content fingerprint.
//!
//! The fingerprint keys ledger entries so results from different template
//! wordings never collide.

use sha2::{Digest, Sha256};

/// `{words}` is replaced with the session's shuffled word list, one per line.
const CONNECTIONS_TEMPLATE: &str = r#""Connections" is a word categorization game. I will provide you with 16 words, and your goal is to find four groups of four words that share a common category. Each word will belong to only one category in the correct solution. Be careful of words that seem like they could fit in more than one category. Consider guessing other categories first to improve your chances of success by elimination of more obvious groups. You have a maximum of four incorrect guesses, so choose carefully!

After I give you the words, you will suggest one group of four words at a time and the category that connects them. I will provide feedback on whether the group of four words is correct or incorrect. The accuracy of the category name is not important; what matters is that the four words belong together. If three out of the four words you guess share a category, I will let you know. Otherwise, I will simply tell you if your guess was correct or incorrect.

Don't get discouraged if you make invalid guesses. Keep trying! I am very patient.

The connection between words is _not_ vague. The connection is clear and unambiguous, although it may not be obvious at first glance.

Sometimes the categories are "outside the box". Here are some examples in the form of `Category: WORD1, WORD2, WORD3, WORD4`:

- Starts of planet names: EAR, MAR, MER, SAT
- Second ___: FIDDLE, GUESS, NATURE, WIND
- Associated with "stub": CIGARETTE, PENCIL, TICKET, TOE
- ___ Dream: AMERICAN, FEVER, LUCID, PIPE

Here is a example solution to a full puzzle for further context

Words:

SPRINKLE
SPONGE
BIRD
ROSE
PICK
CHERRY
DROP
CREAM
MUD
BUBBLE
TOP
SPOT
RUBY
BEST
SPLASH
BRICK

Solution:

- A little bit of a beverage: DROP, SPLASH, SPOT, SPRINKLE
- Shades of red: BRICK, CHERRY, ROSE, RUBY
- ___  Bath: BIRD, BUBBLE, MUD, SPONGE
- Choicest: BEST, CREAM, PICK, TOP

Here are the 16 words:
{words}

First do some thinking inside <scratchpad> tags. Make loose groupings of words and see if you can find one of the easier groupings.
Then make your first guess.

Output guesses in the following format inside the backticks:

```
{"<category>": ["<word_1>", "<word_2>", "<word_3>", "<word_4>"]}
```

For example:

```
{"Types of fish": ["SALMON", "TROUT", "BASS", "STURGEON"]}
```

Good luck!
"#;

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// The built-in Connections instruction template.
    pub fn connections() -> Self {
        Self::from_text(CONNECTIONS_TEMPLATE.to_string())
    }

    pub fn from_text(text: String) -> Self {
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The turn-1 prompt: instructions plus this session's word order.
    pub fn render(&self, words: &[String]) -> String {
        self.text.replace("{words}", &words.join("\n"))
    }

    /// Hex digest of the literal template text (before substitution), used to
    /// key the ledger.
    pub fn fingerprint(&self) -> String {
        sha256_hex(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_the_word_list() {
        let template = PromptTemplate::from_text("Words:\n{words}\nGo!".to_string());
        let words = vec!["EAR".to_string(), "MAR".to_string()];
        assert_eq!(template.render(&words), "Words:\nEAR\nMAR\nGo!");
    }

    #[test]
    fn fingerprint_is_stable_and_ignores_substitution() {
        let template = PromptTemplate::connections();
        let before = template.fingerprint();
        let _ = template.render(&["EAR".to_string()]);
        assert_eq!(template.fingerprint(), before);
        assert_eq!(before.len(), 64);
        assert!(before.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_templates_have_different_fingerprints() {
        let a = PromptTemplate::from_text("a".to_string());
        let b = PromptTemplate::from_text("b".to_string());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn builtin_template_keeps_its_placeholder_and_example_braces() {
        let text = PromptTemplate::connections().text().to_string();
        assert!(text.contains("{words}"));
        // The fenced output example must read as literal JSON to the agent.
        assert!(text.contains(r#"{"Types of fish": ["SALMON", "TROUT", "BASS", "STURGEON"]}"#));
    }
}
