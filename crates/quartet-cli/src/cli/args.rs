use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use quartet_core::engine::RulesProfile;

#[derive(Parser)]
#[command(
    name = "quartet",
    version,
    about = "Plays and scores Connections word puzzles with a conversational LLM"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Play one puzzle and print the shareable summary
    Play(PlayArgs),
    /// Evaluate a model across a range of puzzle dates
    Eval(EvalArgs),
    /// Populate the local puzzle archive from the remote source
    Fetch(FetchArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileArg {
    /// Fenced-JSON guesses, session ends after 3 consecutive invalid replies
    Strict,
    /// Plain-token guesses, no consecutive-invalid cutoff
    Loose,
}

impl ProfileArg {
    pub fn to_rules(self) -> RulesProfile {
        match self {
            ProfileArg::Strict => RulesProfile::strict(),
            ProfileArg::Loose => RulesProfile::loose(),
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct PlayArgs {
    /// Model identifier passed to the provider
    pub model: String,

    /// Puzzle date (defaults to today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = ProfileArg::Strict)]
    pub profile: ProfileArg,

    /// Local puzzle archive
    #[arg(long, default_value = "connections_data")]
    pub data_dir: PathBuf,

    /// Word-shuffle seed
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EvalArgs {
    /// Model identifier passed to the provider
    pub model: String,

    /// Maximum sessions in flight
    #[arg(short = 'p', long, default_value_t = quartet_core::harness::DEFAULT_PARALLELISM)]
    pub parallelism: usize,

    /// First date to evaluate (defaults to the first published puzzle)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last date to evaluate (defaults to today)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = ProfileArg::Strict)]
    pub profile: ProfileArg,

    /// Local puzzle archive
    #[arg(long, default_value = "connections_data")]
    pub data_dir: PathBuf,

    /// Ledger directory
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Base seed for per-session word shuffles
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct FetchArgs {
    /// Local puzzle archive
    #[arg(long, default_value = "connections_data")]
    pub data_dir: PathBuf,
}
