use std::sync::Arc;

use chrono::Local;

use quartet_core::harness::{date_range, Harness, Ledger};
use quartet_core::prompt::PromptTemplate;
use quartet_core::providers::llm::OpenAiProvider;
use quartet_core::puzzle::{CachedSource, HttpSource};
use quartet_core::share::first_puzzle_date;

use crate::cli::args::EvalArgs;

pub async fn run(args: EvalArgs) -> anyhow::Result<i32> {
    let from = args.from.unwrap_or_else(first_puzzle_date);
    let to = args.to.unwrap_or_else(|| Local::now().date_naive());
    let dates = date_range(from, to);
    if dates.is_empty() {
        anyhow::bail!("empty date range: {from} > {to}");
    }

    let template = PromptTemplate::connections();
    let ledger = Ledger::open(&args.results_dir, &args.model, &template.fingerprint())?;
    let harness = Harness {
        model: args.model.clone(),
        template,
        provider: Arc::new(OpenAiProvider::from_env(args.model.clone())?),
        source: Arc::new(CachedSource::new(&args.data_dir).with_remote(HttpSource::new())),
        ledger,
        profile: args.profile.to_rules(),
        parallel: args.parallelism,
        seed: args.seed,
    };

    tracing::info!(%from, %to, dates = dates.len(), "starting evaluation");
    let total = dates.len();
    let records = harness.run(dates).await?;

    let wins = records.iter().filter(|r| r.is_win()).count();
    let solved: usize = records.iter().map(|r| r.solved_count()).sum();
    println!(
        "{}/{} dates evaluated, {} full wins, {} categories solved",
        records.len(),
        total,
        wins,
        solved
    );
    Ok(0)
}
