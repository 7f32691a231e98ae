// src/pipeline/novelty.rs

//! Novelty filtering and persistence of listing rows.
//!
//! Each row ends in exactly one [`ItemOutcome`], so callers can tell why a
//! row was not stored instead of only seeing the final count.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Article, NewArticle};
use crate::services::ListingRow;
use crate::storage::ArticleStore;
use crate::utils::date::extract_post_date;
use crate::utils::url::UrlNormalizer;

/// What happened to one listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// Stored as a new article
    Persisted(Article),
    /// The normalized URL is already stored
    SkippedDuplicate { url: String },
    /// The title carries no valid date lead-in
    SkippedUndated { title: String },
    /// No title link, or a link that does not resolve to an http(s) URL
    SkippedMalformed { title: Option<String> },
}

impl ItemOutcome {
    pub fn persisted(&self) -> Option<&Article> {
        match self {
            Self::Persisted(article) => Some(article),
            _ => None,
        }
    }
}

/// Persist every row whose normalized URL is not stored yet.
///
/// Rows are handled in listing order and each insert commits on its own, so
/// a storage error aborts the remaining rows but keeps the earlier ones.
pub async fn persist_new(
    rows: Vec<ListingRow>,
    store: &dyn ArticleStore,
    normalizer: &UrlNormalizer,
    today: NaiveDate,
) -> Result<Vec<ItemOutcome>> {
    let mut outcomes = Vec::with_capacity(rows.len());

    for row in rows {
        let candidate = match row {
            ListingRow::Topic(candidate) => candidate,
            ListingRow::Malformed => {
                log::debug!("Skipping row without a title link");
                outcomes.push(ItemOutcome::SkippedMalformed { title: None });
                continue;
            }
        };

        let Some(url) = normalizer.normalize(&candidate.href) else {
            log::debug!("Skipping unusable link {:?} ({})", candidate.href, candidate.title);
            outcomes.push(ItemOutcome::SkippedMalformed {
                title: Some(candidate.title),
            });
            continue;
        };

        let Some(post_date) = extract_post_date(&candidate.title, today) else {
            log::debug!("Skipping undated title: {}", candidate.title);
            outcomes.push(ItemOutcome::SkippedUndated {
                title: candidate.title,
            });
            continue;
        };

        if store.exists_by_url(&url).await? {
            log::debug!("Already stored: {url}");
            outcomes.push(ItemOutcome::SkippedDuplicate { url });
            continue;
        }

        // The store re-checks atomically; losing a race reads as a duplicate.
        let outcome = match store
            .insert_if_absent(NewArticle::new(candidate.title, url.clone(), post_date))
            .await?
        {
            Some(article) => {
                log::info!("New article [{}] {} {}", article.post_date, article.title, article.url);
                ItemOutcome::Persisted(article)
            }
            None => {
                log::debug!("Stored concurrently: {url}");
                ItemOutcome::SkippedDuplicate { url }
            }
        };
        outcomes.push(outcome);
    }

    Ok(outcomes)
}
