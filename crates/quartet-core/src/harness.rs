//! Concurrent, resumable batch evaluation against a persisted ledger.

use std::collections::hash_map::DefaultHasher;
use std::fs::OpenOptions;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::engine::{GameSession, RulesProfile};
use crate::model::{EvaluationRecord, Puzzle};
use crate::prompt::PromptTemplate;
use crate::providers::llm::ChatProvider;
use crate::puzzle::PuzzleSource;

pub const DEFAULT_PARALLELISM: usize = 10;

/// Append-only newline-delimited JSON of evaluation outcomes, one file per
/// (model, prompt fingerprint).
///
/// Lookup and append are each one critical section on the same lock, and
/// `append_if_absent` re-checks the key before writing, so two tasks racing
/// on the same date cannot produce a duplicate line.
#[derive(Clone)]
pub struct Ledger {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl Ledger {
    /// Opens (creating if needed) `{dir}/{model}_{prompt_hash}.jsonl`.
    pub fn open(dir: &Path, model: &str, prompt_hash: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating results dir {}", dir.display()))?;
        let path = dir.join(format!("{model}_{prompt_hash}.jsonl"));
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening ledger {}", path.display()))?;
        Ok(Self {
            path,
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lookup(
        &self,
        model: &str,
        prompt_hash: &str,
        game_date: NaiveDate,
    ) -> anyhow::Result<Option<EvaluationRecord>> {
        let _guard = self.lock.lock().expect("ledger lock poisoned");
        self.scan(model, prompt_hash, game_date)
    }

    /// Appends `record` unless its key is already present, returning the
    /// stored record either way.
    pub fn append_if_absent(&self, record: EvaluationRecord) -> anyhow::Result<EvaluationRecord> {
        let _guard = self.lock.lock().expect("ledger lock poisoned");
        if let Some(existing) = self.scan(&record.model, &record.prompt_hash, record.game_date)? {
            tracing::warn!(
                date = %record.game_date,
                "record appeared while session ran, keeping the stored one"
            );
            return Ok(existing);
        }
        let line = serde_json::to_string(&record).context("serializing evaluation record")?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening ledger {}", self.path.display()))?;
        writeln!(file, "{line}").context("appending to ledger")?;
        Ok(record)
    }

    fn scan(
        &self,
        model: &str,
        prompt_hash: &str,
        game_date: NaiveDate,
    ) -> anyhow::Result<Option<EvaluationRecord>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading ledger {}", self.path.display()))?;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: EvaluationRecord =
                serde_json::from_str(line).context("malformed ledger line")?;
            if record.model == model
                && record.prompt_hash == prompt_hash
                && record.game_date == game_date
            {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

/// Runs one independent game session per puzzle date under bounded
/// concurrency, skipping dates the ledger already holds.
#[derive(Clone)]
pub struct Harness {
    pub model: String,
    pub template: PromptTemplate,
    pub provider: Arc<dyn ChatProvider>,
    pub source: Arc<dyn PuzzleSource>,
    pub ledger: Ledger,
    pub profile: RulesProfile,
    pub parallel: usize,
    /// Base seed; each session derives its own from this plus its date.
    pub seed: u64,
}

impl Harness {
    /// Evaluates every date, at most `parallel` sessions in flight. Failed
    /// sessions are logged and leave no ledger record, so the next run
    /// retries them; completed dates are returned in date order.
    pub async fn run(&self, dates: Vec<NaiveDate>) -> anyhow::Result<Vec<EvaluationRecord>> {
        let semaphore = Arc::new(Semaphore::new(self.parallel.max(1)));
        let mut join_set = JoinSet::new();

        for date in dates {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("semaphore closed")?;
            let this = self.clone();
            join_set.spawn(async move {
                let _permit = permit;
                (date, this.evaluate_date(date).await)
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            let (date, result) = joined.context("session task panicked")?;
            match result {
                Ok(record) => records.push(record),
                // No record is written for a failed date; a future run
                // retries it.
                Err(e) => tracing::warn!(%date, error = ?e, "session failed"),
            }
        }
        records.sort_by_key(|r| r.game_date);
        Ok(records)
    }

    /// Evaluates one date: idempotent ledger check, then a full session.
    pub async fn evaluate_date(&self, date: NaiveDate) -> anyhow::Result<EvaluationRecord> {
        let prompt_hash = self.template.fingerprint();
        if let Some(existing) = self.ledger.lookup(&self.model, &prompt_hash, date)? {
            tracing::info!(%date, "already evaluated, skipping");
            return Ok(existing);
        }

        tracing::info!(%date, model = %self.model, "running evaluation");
        let document = self
            .source
            .fetch(date)
            .await
            .with_context(|| format!("fetching puzzle for {date}"))?;
        let categories = document.into_categories()?;
        let mut rng = StdRng::seed_from_u64(session_seed(self.seed, date));
        let puzzle = Puzzle::new(categories, &mut rng)?;
        let initial_prompt = self.template.render(puzzle.words());

        let mut session = GameSession::new(puzzle, self.profile, initial_prompt);
        let mut conversation = self.provider.start_conversation();
        let outcome = session.play(conversation.as_mut()).await?;
        tracing::info!(%date, ?outcome, "session finished");

        let record = EvaluationRecord::new(
            self.model.clone(),
            prompt_hash,
            date,
            session.state().solved_levels(),
        );
        self.ledger.append_if_absent(record)
    }
}

/// Stable per-session seed so concurrent sessions are independently
/// reproducible.
fn session_seed(base: u64, date: NaiveDate) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    date.hash(&mut hasher);
    hasher.finish()
}

/// Inclusive date range, oldest first.
pub fn date_range(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = from;
    while current <= to {
        dates.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    dates
}
