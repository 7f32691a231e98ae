//! Article data structures.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A topic persisted in the article store.
///
/// `url` is the normalized identity key; no two stored articles share it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    /// Topic title as shown on the listing
    pub title: String,

    /// Normalized absolute URL
    pub url: String,

    /// Date parsed from the title prefix
    pub post_date: NaiveDate,

    /// When the article was first stored
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Format article for display using a template.
    ///
    /// Supported placeholders:
    /// - `{title}`, `{url}`, `{date}`, `{created_at}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{title}", &self.title)
            .replace("{url}", &self.url)
            .replace("{date}", &self.post_date.to_string())
            .replace("{created_at}", &self.created_at.to_rfc3339())
    }
}

/// An article about to be inserted. The store stamps `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    pub post_date: NaiveDate,
}

impl NewArticle {
    pub fn new(title: impl Into<String>, url: impl Into<String>, post_date: NaiveDate) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            post_date,
        }
    }

    /// Stamp the record with its creation time.
    pub fn into_article(self, created_at: DateTime<Utc>) -> Article {
        Article {
            title: self.title,
            url: self.url,
            post_date: self.post_date,
            created_at,
        }
    }
}

/// A topic row scraped from the listing, before any normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Title text with whitespace collapsed
    pub title: String,

    /// Link target exactly as it appears in the markup
    pub href: String,
}

impl Candidate {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
        }
    }
}
