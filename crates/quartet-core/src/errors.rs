use thiserror::Error;

/// Construction-time puzzle failures. Everything else in the crate reports
/// through `anyhow` at the session/harness boundary; malformed agent replies
/// are never errors, they become
/// [`crate::model::GuessOutcome::Invalid`] guesses.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid puzzle: {0}")]
    InvalidPuzzle(String),
}
