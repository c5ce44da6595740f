use chrono::Local;

use quartet_core::harness::date_range;
use quartet_core::puzzle::{CachedSource, HttpSource};
use quartet_core::share::first_puzzle_date;

use crate::cli::args::FetchArgs;

/// Walks today back to the first published puzzle, fetching whatever the
/// archive is missing. Sequential on purpose: this is a courtesy crawl.
pub async fn run(args: FetchArgs) -> anyhow::Result<i32> {
    let source = CachedSource::new(&args.data_dir).with_remote(HttpSource::new());
    let today = Local::now().date_naive();

    let mut fetched = 0usize;
    let mut skipped = 0usize;
    for date in date_range(first_puzzle_date(), today).into_iter().rev() {
        if source.ensure(date).await? {
            tracing::info!(%date, "fetched");
            fetched += 1;
        } else {
            tracing::debug!(%date, "already archived");
            skipped += 1;
        }
    }
    println!("{fetched} fetched, {skipped} already archived");
    Ok(0)
}
