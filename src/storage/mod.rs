//! Storage abstractions for article persistence.
//!
//! Two backends implement [`ArticleStore`]:
//! - `SqliteStorage`: `article` table with `UNIQUE(url)`; insert-if-absent is a
//!   single `INSERT ... ON CONFLICT DO NOTHING`, safe across processes.
//! - `LocalStorage`: one JSON document rewritten atomically; check-and-insert
//!   is serialized by an in-process lock.
//!
//! ## Directory Structure
//!
//! ```text
//! data/
//! ├── config.toml     # Watcher configuration
//! ├── articles.db     # SQLite backend
//! └── articles.json   # JSON backend (default directory "data")
//! ```

pub mod local;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Article, NewArticle, StorageBackend, StorageConfig};

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

/// Trait for article storage backends.
///
/// Ordering conventions: "newest" means greatest `post_date`, ties broken by
/// latest `created_at`, then by latest insertion.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Whether an article with this normalized URL is stored.
    async fn exists_by_url(&self, url: &str) -> Result<bool>;

    /// Insert unless the URL is already stored.
    ///
    /// The check and the insert are one atomic step; `None` means the URL
    /// was already present.
    async fn insert_if_absent(&self, article: NewArticle) -> Result<Option<Article>>;

    /// Number of stored articles.
    async fn count(&self) -> Result<usize>;

    /// Keep the `keep` newest articles and delete the rest.
    /// Returns the number of deleted articles.
    async fn delete_oldest_beyond(&self, keep: usize) -> Result<usize>;

    /// Delete every article. Returns the number of deleted articles.
    async fn delete_all(&self) -> Result<usize>;

    /// Articles with `start <= post_date <= end`, oldest first.
    async fn select_by_date_range(&self, start: NaiveDate, end: NaiveDate)
    -> Result<Vec<Article>>;

    /// Newest articles first, at most `limit` when given.
    async fn select_ordered(&self, limit: Option<usize>) -> Result<Vec<Article>>;
}

/// Comparator putting the newest article first.
pub fn newest_first(a: &Article, b: &Article) -> Ordering {
    b.post_date
        .cmp(&a.post_date)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Open the configured backend.
pub fn open_store(config: &StorageConfig) -> Result<Box<dyn ArticleStore>> {
    let path = config.resolved_path();
    match config.backend {
        StorageBackend::Json => Ok(Box::new(LocalStorage::new(path))),
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite => Ok(Box::new(SqliteStorage::open(path)?)),
        #[cfg(not(feature = "sqlite"))]
        StorageBackend::Sqlite => Err(crate::error::AppError::config(
            "storage.backend = \"sqlite\" requires the `sqlite` feature",
        )),
    }
}
