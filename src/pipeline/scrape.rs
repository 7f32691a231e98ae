// src/pipeline/scrape.rs

//! Scrape pipeline: fetch the listing, persist new topics, apply retention.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Article, Config};
use crate::services::{ForumCrawler, PageFetcher};
use crate::storage::ArticleStore;
use crate::utils::url::UrlNormalizer;

use super::novelty::{ItemOutcome, persist_new};
use super::retention::apply_retention;

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One outcome per listing row, in listing order
    pub outcomes: Vec<ItemOutcome>,
    /// Articles removed by retention
    pub evicted: usize,
}

/// Outcome counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeStats {
    pub persisted: usize,
    pub duplicate: usize,
    pub undated: usize,
    pub malformed: usize,
}

impl ScrapeReport {
    /// Newly persisted articles in listing order.
    pub fn new_articles(&self) -> Vec<Article> {
        self.outcomes
            .iter()
            .filter_map(ItemOutcome::persisted)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> ScrapeStats {
        let mut stats = ScrapeStats::default();
        for outcome in &self.outcomes {
            match outcome {
                ItemOutcome::Persisted(_) => stats.persisted += 1,
                ItemOutcome::SkippedDuplicate { .. } => stats.duplicate += 1,
                ItemOutcome::SkippedUndated { .. } => stats.undated += 1,
                ItemOutcome::SkippedMalformed { .. } => stats.malformed += 1,
            }
        }
        stats
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Run fetch, novelty filter and retention once.
///
/// A fetch failure aborts before anything is stored. A storage failure
/// aborts the run, leaving articles persisted before it in place.
pub async fn run_scrape_pipeline(
    config: &Config,
    fetcher: Arc<dyn PageFetcher>,
    store: &dyn ArticleStore,
    today: NaiveDate,
) -> Result<ScrapeReport> {
    let started_at = Utc::now();

    let crawler = ForumCrawler::new(&config.forum, fetcher)?;
    let normalizer = UrlNormalizer::new(config.forum.base()?, config.forum.session_params.clone());

    let rows = crawler.fetch_rows().await?;
    let outcomes = persist_new(rows, store, &normalizer, today).await?;
    let evicted = apply_retention(store, config.retention.keep).await?;

    let report = ScrapeReport {
        started_at,
        finished_at: Utc::now(),
        outcomes,
        evicted,
    };

    let stats = report.stats();
    log::info!(
        "Scrape finished in {}ms: {} new, {} duplicate, {} undated, {} malformed, {} evicted",
        report.duration_ms(),
        stats.persisted,
        stats.duplicate,
        stats.undated,
        stats.malformed,
        report.evicted
    );

    Ok(report)
}
