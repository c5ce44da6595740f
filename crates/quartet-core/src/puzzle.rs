//! The consumed puzzle document and where it comes from.
//!
//! The remote endpoint serves one JSON document per date; `CachedSource` keeps
//! a local archive so repeated harness runs do not refetch.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::CoreError;
use crate::model::{Category, CATEGORY_SIZE};

pub const DEFAULT_BASE_URL: &str = "https://www.nytimes.com/svc/connections/v2";

/// Wire shape of one day's puzzle as served by the remote source.
#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleDocument {
    pub categories: Vec<CategoryDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDocument {
    pub title: String,
    pub cards: Vec<Card>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    pub content: String,
    /// 0-based slot index on the published board; `position / 4` of a
    /// category's first card is its difficulty level.
    pub position: u32,
}

impl PuzzleDocument {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::InvalidPuzzle(format!("malformed puzzle document: {e}")))
    }

    /// Converts the wire document into model categories. Word-set invariants
    /// are checked later by [`crate::model::Puzzle::new`]; this only rejects
    /// shapes the level derivation cannot survive.
    pub fn into_categories(self) -> Result<Vec<Category>, CoreError> {
        self.categories
            .into_iter()
            .map(|doc| {
                let first = doc.cards.first().ok_or_else(|| {
                    CoreError::InvalidPuzzle(format!("category '{}' has no cards", doc.title))
                })?;
                let level = u8::try_from(first.position as usize / CATEGORY_SIZE)
                    .map_err(|_| CoreError::InvalidPuzzle("card position out of range".into()))?;
                Ok(Category {
                    name: doc.title,
                    words: doc.cards.into_iter().map(|card| card.content).collect(),
                    level,
                })
            })
            .collect()
    }
}

/// Where puzzle documents come from. Fetch failures are fatal to the session
/// for that date only; the harness leaves no ledger record so a later run
/// retries it.
#[async_trait]
pub trait PuzzleSource: Send + Sync {
    async fn fetch(&self, date: NaiveDate) -> anyhow::Result<PuzzleDocument>;
}

/// Direct HTTP source against the published per-date endpoint.
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_raw(&self, date: NaiveDate) -> anyhow::Result<String> {
        let url = format!("{}/{}.json", self.base_url, date.format("%Y-%m-%d"));
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            anyhow::bail!("puzzle endpoint returned {} for {}", resp.status(), url);
        }
        Ok(resp.text().await?)
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PuzzleSource for HttpSource {
    async fn fetch(&self, date: NaiveDate) -> anyhow::Result<PuzzleDocument> {
        let raw = self.fetch_raw(date).await?;
        Ok(PuzzleDocument::parse(&raw)?)
    }
}

/// Read-through archive of raw puzzle documents, one `{date}.json` per file.
/// With a remote attached, misses are fetched and written back; without one
/// it is a purely local source.
pub struct CachedSource {
    dir: PathBuf,
    remote: Option<HttpSource>,
}

impl CachedSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            remote: None,
        }
    }

    pub fn with_remote(mut self, remote: HttpSource) -> Self {
        self.remote = Some(remote);
        self
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    /// Makes sure the archive holds `date`, fetching it if absent. Returns
    /// true when a fetch happened.
    pub async fn ensure(&self, date: NaiveDate) -> anyhow::Result<bool> {
        let path = self.path_for(date);
        if tokio::fs::try_exists(&path).await? {
            return Ok(false);
        }
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no cached document for {date} and no remote source"))?;
        let raw = remote.fetch_raw(date).await?;
        // Validate before persisting so a bad upstream reply never poisons
        // the archive.
        PuzzleDocument::parse(&raw)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, raw).await?;
        Ok(true)
    }
}

#[async_trait]
impl PuzzleSource for CachedSource {
    async fn fetch(&self, date: NaiveDate) -> anyhow::Result<PuzzleDocument> {
        self.ensure(date).await?;
        let raw = tokio::fs::read_to_string(self.path_for(date)).await?;
        Ok(PuzzleDocument::parse(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "categories": [
            {"title": "Starts of planet names", "cards": [
                {"content": "EAR", "position": 0},
                {"content": "MAR", "position": 1},
                {"content": "MER", "position": 2},
                {"content": "SAT", "position": 3}
            ]},
            {"title": "Second ___", "cards": [
                {"content": "FIDDLE", "position": 4},
                {"content": "GUESS", "position": 5},
                {"content": "NATURE", "position": 6},
                {"content": "WIND", "position": 7}
            ]},
            {"title": "Stub", "cards": [
                {"content": "CIGARETTE", "position": 8},
                {"content": "PENCIL", "position": 9},
                {"content": "TICKET", "position": 10},
                {"content": "TOE", "position": 11}
            ]},
            {"title": "___ Dream", "cards": [
                {"content": "AMERICAN", "position": 12},
                {"content": "FEVER", "position": 13},
                {"content": "LUCID", "position": 14},
                {"content": "PIPE", "position": 15}
            ]}
        ]
    }"#;

    #[test]
    fn level_is_derived_from_first_card_position() {
        let doc = PuzzleDocument::parse(DOC).expect("parses");
        let categories = doc.into_categories().expect("converts");
        let levels: Vec<u8> = categories.iter().map(|c| c.level).collect();
        assert_eq!(levels, vec![0, 1, 2, 3]);
        assert!(categories[0].words.contains("EAR"));
    }

    #[test]
    fn empty_category_is_rejected() {
        let doc = PuzzleDocument {
            categories: vec![CategoryDocument {
                title: "empty".into(),
                cards: vec![],
            }],
        };
        assert!(doc.into_categories().is_err());
    }

    #[tokio::test]
    async fn cached_source_reads_local_archive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let date = NaiveDate::from_ymd_opt(2023, 6, 12).unwrap();
        std::fs::write(dir.path().join("2023-06-12.json"), DOC).expect("write fixture");

        let source = CachedSource::new(dir.path());
        let doc = source.fetch(date).await.expect("served from archive");
        assert_eq!(doc.categories.len(), 4);

        // A miss with no remote attached is an error, not a panic.
        let missing = NaiveDate::from_ymd_opt(2023, 6, 13).unwrap();
        assert!(source.fetch(missing).await.is_err());
    }
}
