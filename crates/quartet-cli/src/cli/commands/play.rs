use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;

use quartet_core::engine::GameSession;
use quartet_core::model::Puzzle;
use quartet_core::prompt::PromptTemplate;
use quartet_core::providers::llm::{ChatProvider, OpenAiProvider};
use quartet_core::puzzle::{CachedSource, HttpSource, PuzzleSource};
use quartet_core::share::format_game_log;

use crate::cli::args::{PlayArgs, ProfileArg};

pub async fn run(args: PlayArgs) -> anyhow::Result<i32> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let source = CachedSource::new(&args.data_dir).with_remote(HttpSource::new());
    let document = source.fetch(date).await?;
    let categories = document.into_categories()?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let puzzle = Puzzle::new(categories, &mut rng)?;
    let template = PromptTemplate::connections();
    let initial_prompt = template.render(puzzle.words());

    let provider = OpenAiProvider::from_env(args.model.clone())?;
    let mut conversation = provider.start_conversation();
    let mut session = GameSession::new(puzzle, args.profile.to_rules(), initial_prompt);
    let outcome = session.play(conversation.as_mut()).await?;
    tracing::info!(?outcome, %date, "finished");

    // The loose profile keeps sessions going past malformed replies, so its
    // summary shows those guesses too.
    let include_invalid = args.profile == ProfileArg::Loose;
    let state = session.into_state();
    println!(
        "{}",
        format_game_log(
            &args.model,
            date,
            state.puzzle(),
            state.guesses(),
            include_invalid
        )
    );
    Ok(0)
}
