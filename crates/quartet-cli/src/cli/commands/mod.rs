use crate::cli::args::{Cli, Command};

mod eval;
mod fetch;
mod play;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Play(args) => play::run(args).await,
        Command::Eval(args) => eval::run(args).await,
        Command::Fetch(args) => fetch::run(args).await,
    }
}
