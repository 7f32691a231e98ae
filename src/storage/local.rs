//! Local filesystem storage implementation.
//!
//! Keeps every article in one JSON document and rewrites it atomically on
//! each change. Check-and-insert runs under a lock, which makes it atomic
//! within one process only; concurrent processes should use the SQLite
//! backend.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! └── articles.json     # { updated_at, count, articles: [...] }
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{Article, NewArticle};
use crate::storage::{ArticleStore, newest_first};

const ARTICLES_KEY: &str = "articles.json";

/// On-disk document holding the article set, in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleFile {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    /// Total article count
    pub count: usize,
    /// The articles array
    pub articles: Vec<Article>,
}

impl ArticleFile {
    pub fn new(articles: Vec<Article>) -> Self {
        Self {
            updated_at: Utc::now(),
            count: articles.len(),
            articles,
        }
    }
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    root_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn load_articles(&self) -> Result<Vec<Article>> {
        Ok(self
            .read_json::<ArticleFile>(ARTICLES_KEY)
            .await?
            .map(|file| file.articles)
            .unwrap_or_default())
    }

    async fn save_articles(&self, articles: Vec<Article>) -> Result<()> {
        self.write_json(ARTICLES_KEY, &ArticleFile::new(articles)).await
    }
}

/// Indices of `articles` sorted newest first; later insertions win exact ties.
fn newest_indices(articles: &[Article]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..articles.len()).collect();
    order.sort_by(|&a, &b| newest_first(&articles[a], &articles[b]).then(b.cmp(&a)));
    order
}

#[async_trait]
impl ArticleStore for LocalStorage {
    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        Ok(self.load_articles().await?.iter().any(|a| a.url == url))
    }

    async fn insert_if_absent(&self, article: NewArticle) -> Result<Option<Article>> {
        let _guard = self.write_lock.lock().await;

        let mut articles = self.load_articles().await?;
        if articles.iter().any(|a| a.url == article.url) {
            return Ok(None);
        }

        let article = article.into_article(Utc::now());
        articles.push(article.clone());
        self.save_articles(articles).await?;
        Ok(Some(article))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.load_articles().await?.len())
    }

    async fn delete_oldest_beyond(&self, keep: usize) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut articles = self.load_articles().await?;
        if articles.len() <= keep {
            return Ok(0);
        }

        let kept: HashSet<usize> = newest_indices(&articles).into_iter().take(keep).collect();
        let before = articles.len();
        let mut index = 0;
        articles.retain(|_| {
            let keep_it = kept.contains(&index);
            index += 1;
            keep_it
        });

        let deleted = before - articles.len();
        self.save_articles(articles).await?;
        Ok(deleted)
    }

    async fn delete_all(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let deleted = self.load_articles().await?.len();
        self.save_articles(Vec::new()).await?;
        Ok(deleted)
    }

    async fn select_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Article>> {
        let articles = self.load_articles().await?;
        let mut order = newest_indices(&articles);
        order.reverse();

        Ok(order
            .into_iter()
            .map(|i| &articles[i])
            .filter(|a| start <= a.post_date && a.post_date <= end)
            .cloned()
            .collect())
    }

    async fn select_ordered(&self, limit: Option<usize>) -> Result<Vec<Article>> {
        let articles = self.load_articles().await?;
        Ok(newest_indices(&articles)
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|i| articles[i].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{exercise_store, exercise_tie_break, topic, ymd};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes("nope.txt").await.unwrap();
        assert!(data.is_none());
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_contract() {
        let tmp = TempDir::new().unwrap();
        exercise_store(&LocalStorage::new(tmp.path())).await;
    }

    #[tokio::test]
    async fn test_tie_break() {
        let tmp = TempDir::new().unwrap();
        exercise_tie_break(&LocalStorage::new(tmp.path())).await;
    }

    #[tokio::test]
    async fn test_articles_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let storage = LocalStorage::new(tmp.path());
            storage
                .insert_if_absent(topic(7, ymd(2025, 12, 9)))
                .await
                .unwrap();
        }

        let reopened = LocalStorage::new(tmp.path());
        assert_eq!(reopened.count().await.unwrap(), 1);

        let file: ArticleFile = reopened.read_json(ARTICLES_KEY).await.unwrap().unwrap();
        assert_eq!(file.count, 1);
        assert_eq!(file.articles[0].post_date, ymd(2025, 12, 9));
        assert!(!tmp.path().join("articles.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_storage_failure() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.write_bytes(ARTICLES_KEY, b"{ not json").await.unwrap();

        let err = storage.count().await.unwrap_err();
        assert!(err.is_storage_failure());
    }
}
