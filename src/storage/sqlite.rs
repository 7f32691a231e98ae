//! SQLite storage implementation.
//!
//! The `article` table enforces `UNIQUE (url)`, so insert-if-absent is a
//! single statement and stays correct when several processes share the file.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};

use crate::error::{AppError, Result};
use crate::models::{Article, NewArticle};
use crate::storage::ArticleStore;

// created_at is stored as microseconds since the epoch so it orders numerically
pub const CREATE_ARTICLE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS article (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    post_date TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    UNIQUE (url)
);
CREATE INDEX IF NOT EXISTS article_post_date ON article (post_date);
"#;

const NEWEST_FIRST: &str = "post_date DESC, created_at DESC, id DESC";

/// SQLite-backed article store.
///
/// Statements run on tokio's blocking pool; the connection is shared with
/// those tasks through an `Arc<Mutex<_>>`.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        log::debug!("Opened article database {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(CREATE_ARTICLE_TABLE)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<T> {
            let conn = conn
                .lock()
                .map_err(|_| AppError::storage("article database lock poisoned"))?;
            Ok(f(&conn)?)
        })
        .await
        .map_err(AppError::storage)?
    }

    async fn query_articles(&self, sql: String, values: Vec<Value>) -> Result<Vec<Article>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let articles = stmt
                .query_map(params_from_iter(values), row_to_article)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(articles)
        })
        .await
    }
}

fn row_to_article(row: &Row) -> rusqlite::Result<Article> {
    let micros: i64 = row.get(3)?;
    let created_at = DateTime::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(3, micros))?;

    Ok(Article {
        title: row.get(0)?,
        url: row.get(1)?,
        post_date: row.get(2)?,
        created_at,
    })
}

#[async_trait]
impl ArticleStore for SqliteStorage {
    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM article WHERE url = ?1)",
                params![url],
                |row| row.get(0),
            )
        })
        .await
    }

    async fn insert_if_absent(&self, article: NewArticle) -> Result<Option<Article>> {
        let article = article.into_article(Utc::now());
        let row = article.clone();
        let inserted = self
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO article (title, url, post_date, created_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (url) DO NOTHING",
                    params![
                        row.title,
                        row.url,
                        row.post_date,
                        row.created_at.timestamp_micros()
                    ],
                )
            })
            .await?;

        Ok((inserted == 1).then_some(article))
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = self
            .with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM article", [], |row| row.get(0)))
            .await?;
        Ok(count as usize)
    }

    async fn delete_oldest_beyond(&self, keep: usize) -> Result<usize> {
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);
        self.with_conn(move |conn| {
            conn.execute(
                &format!(
                    "DELETE FROM article WHERE id NOT IN
                     (SELECT id FROM article ORDER BY {NEWEST_FIRST} LIMIT ?1)"
                ),
                params![keep],
            )
        })
        .await
    }

    async fn delete_all(&self) -> Result<usize> {
        self.with_conn(|conn| conn.execute("DELETE FROM article", []))
            .await
    }

    async fn select_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Article>> {
        self.query_articles(
            "SELECT title, url, post_date, created_at FROM article
             WHERE post_date BETWEEN ?1 AND ?2
             ORDER BY post_date ASC, created_at ASC, id ASC"
                .to_string(),
            vec![Value::Text(start.to_string()), Value::Text(end.to_string())],
        )
        .await
    }

    async fn select_ordered(&self, limit: Option<usize>) -> Result<Vec<Article>> {
        // A negative LIMIT means no limit in SQLite
        let limit = limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
        self.query_articles(
            format!(
                "SELECT title, url, post_date, created_at FROM article
                 ORDER BY {NEWEST_FIRST} LIMIT ?1"
            ),
            vec![Value::Integer(limit)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{exercise_store, exercise_tie_break, topic, ymd};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_contract() {
        exercise_store(&SqliteStorage::open_in_memory().unwrap()).await;
    }

    #[tokio::test]
    async fn test_tie_break() {
        exercise_tie_break(&SqliteStorage::open_in_memory().unwrap()).await;
    }

    #[tokio::test]
    async fn test_url_is_unique_at_schema_level() {
        let store = SqliteStorage::open_in_memory().unwrap();
        store
            .insert_if_absent(topic(1, ymd(2025, 12, 9)))
            .await
            .unwrap();

        let result = store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO article (title, url, post_date, created_at) VALUES ('x', ?1, '2025-12-09', 0)",
                    params!["https://yoyo.club.tw/viewtopic.php?f=2&t=1"],
                )
            })
            .await;
        assert!(matches!(result, Err(AppError::Sqlite(_))));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_created_at_round_trips() {
        let store = SqliteStorage::open_in_memory().unwrap();
        let inserted = store
            .insert_if_absent(topic(5, ymd(2025, 12, 10)))
            .await
            .unwrap()
            .unwrap();

        let stored = store.select_ordered(Some(1)).await.unwrap();
        assert_eq!(
            stored[0].created_at.timestamp_micros(),
            inserted.created_at.timestamp_micros()
        );
        assert_eq!(stored[0].post_date, ymd(2025, 12, 10));
    }

    #[tokio::test]
    async fn test_two_handles_share_one_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("articles.db");
        let a = SqliteStorage::open(&path).unwrap();
        let b = SqliteStorage::open(&path).unwrap();

        assert!(a.insert_if_absent(topic(9, ymd(2025, 12, 9))).await.unwrap().is_some());
        assert!(b.insert_if_absent(topic(9, ymd(2025, 12, 9))).await.unwrap().is_none());
        assert_eq!(b.count().await.unwrap(), 1);
    }
}
