//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, Utc};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::ListingSelectors;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listing endpoint and HTTP behavior
    #[serde(default)]
    pub forum: ForumConfig,

    /// Bounded history settings
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Article store location and backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// How "today" is computed
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// Subscriber-facing message templates
    #[serde(default)]
    pub messages: MessagesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or the defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config not found at {}. Using defaults.", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let forum = &self.forum;
        if forum.user_agent.trim().is_empty() {
            return Err(AppError::validation("forum.user_agent is empty"));
        }
        if forum.timeout_secs == 0 {
            return Err(AppError::validation("forum.timeout_secs must be > 0"));
        }
        Url::parse(&forum.listing_url)
            .map_err(|e| AppError::validation(format!("forum.listing_url: {e}")))?;
        let base = forum.base()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation("forum.base_url must be http(s)"));
        }
        for selector in [
            &forum.selectors.row_selector,
            &forum.selectors.title_selector,
        ] {
            Selector::parse(selector)
                .map_err(|e| AppError::selector(selector, format!("{e:?}")))?;
        }
        if forum.selectors.attr_name.trim().is_empty() {
            return Err(AppError::validation("forum.selectors.attr_name is empty"));
        }
        if self.storage.backend == StorageBackend::Json
            && self.storage.resolved_path().extension().is_some_and(|ext| ext == "db")
        {
            return Err(AppError::validation(
                "storage.path names a .db file but storage.backend is \"json\"",
            ));
        }
        if self.retention.keep == 0 {
            return Err(AppError::validation("retention.keep must be > 0"));
        }
        if !(-23..=23).contains(&self.calendar.utc_offset_hours) {
            return Err(AppError::validation(
                "calendar.utc_offset_hours must be within -23..=23",
            ));
        }
        Ok(())
    }
}

/// Listing endpoint and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumConfig {
    /// Page that lists the newest topics
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,

    /// Base that relative topic links are resolved against
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Extra request headers sent with every fetch
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Query parameters that identify a server-side session
    #[serde(default = "defaults::session_params")]
    pub session_params: Vec<String>,

    /// Row/title markup convention of the listing
    #[serde(default)]
    pub selectors: ListingSelectors,
}

impl ForumConfig {
    /// Parsed base URL.
    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(AppError::from)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            listing_url: defaults::listing_url(),
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            headers: BTreeMap::new(),
            session_params: defaults::session_params(),
            selectors: ListingSelectors::default(),
        }
    }
}

/// Bounded history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Number of most recent articles kept after each run
    #[serde(default = "defaults::keep")]
    pub keep: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            keep: defaults::keep(),
        }
    }
}

/// Which article store implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// SQLite database with a UNIQUE(url) constraint
    #[default]
    Sqlite,
    /// Single JSON document, rewritten atomically
    Json,
}

/// Article store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database file (sqlite) or directory (json); defaults per backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn new(backend: StorageBackend, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: Some(path.into()),
        }
    }

    /// Configured path, or the backend's default location.
    pub fn resolved_path(&self) -> PathBuf {
        match (&self.path, self.backend) {
            (Some(path), _) => path.clone(),
            (None, StorageBackend::Sqlite) => defaults::sqlite_path(),
            (None, StorageBackend::Json) => defaults::json_dir(),
        }
    }
}

/// Calendar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Offset of the forum's local time from UTC, in hours
    #[serde(default = "defaults::utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl CalendarConfig {
    /// Current date in the forum's local time.
    pub fn today(&self) -> NaiveDate {
        match FixedOffset::east_opt(self.utc_offset_hours * 3600) {
            Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
            None => Utc::now().date_naive(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: defaults::utc_offset_hours(),
        }
    }
}

/// Message templates.
///
/// Header placeholders: `{start}`, `{end}`, `{count}`, `{total}`, `{shown}`.
/// Line placeholders are those of [`crate::models::Article::format`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    #[serde(default = "defaults::week_header")]
    pub week_header: String,
    #[serde(default = "defaults::week_line")]
    pub week_line: String,
    #[serde(default = "defaults::week_empty")]
    pub week_empty: String,
    #[serde(default = "defaults::new_header")]
    pub new_header: String,
    #[serde(default = "defaults::new_line")]
    pub new_line: String,
    #[serde(default = "defaults::store_header")]
    pub store_header: String,
    #[serde(default = "defaults::store_line")]
    pub store_line: String,
    #[serde(default = "defaults::store_empty")]
    pub store_empty: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            week_header: defaults::week_header(),
            week_line: defaults::week_line(),
            week_empty: defaults::week_empty(),
            new_header: defaults::new_header(),
            new_line: defaults::new_line(),
            store_header: defaults::store_header(),
            store_line: defaults::store_line(),
            store_empty: defaults::store_empty(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Forum defaults
    pub fn listing_url() -> String {
        "https://yoyo.club.tw/viewforum.php?f=2".into()
    }
    pub fn base_url() -> String {
        "https://yoyo.club.tw/".into()
    }
    pub fn user_agent() -> String {
        "YoYo-Bot/1.0".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn session_params() -> Vec<String> {
        vec!["sid".into()]
    }

    pub fn keep() -> usize {
        20
    }

    pub fn sqlite_path() -> PathBuf {
        PathBuf::from("data/articles.db")
    }
    pub fn json_dir() -> PathBuf {
        PathBuf::from("data")
    }

    pub fn utc_offset_hours() -> i32 {
        8
    }

    // Message defaults
    pub fn week_header() -> String {
        "本週文章 ({start} - {end}):".into()
    }
    pub fn week_line() -> String {
        "[{title}]: {url}".into()
    }
    pub fn week_empty() -> String {
        "本週沒有新文章".into()
    }
    pub fn new_header() -> String {
        "發現 {count} 篇新文章:".into()
    }
    pub fn new_line() -> String {
        "[{date}] {title}\n{url}".into()
    }
    pub fn store_header() -> String {
        "資料庫文章 (共 {total} 篇，顯示最新 {shown} 篇):".into()
    }
    pub fn store_line() -> String {
        "[{date}] {title}".into()
    }
    pub fn store_empty() -> String {
        "資料庫沒有文章".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.forum.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_keep() {
        let mut config = Config::default();
        config.retention.keep = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_selector() {
        let mut config = Config::default();
        config.forum.selectors.row_selector = "[[invalid".to_string();
        assert!(matches!(
            config.validate(),
            Err(AppError::Selector { .. })
        ));
    }

    #[test]
    fn validate_rejects_non_http_base() {
        let mut config = Config::default();
        config.forum.base_url = "ftp://yoyo.club.tw/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [forum]
            listing_url = "https://forum.example/viewforum.php?f=9"

            [forum.headers]
            X-Bot-Secret = "s3cret"

            [retention]
            keep = 5

            [storage]
            backend = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.forum.listing_url, "https://forum.example/viewforum.php?f=9");
        assert_eq!(config.forum.timeout_secs, 30);
        assert_eq!(config.forum.session_params, vec!["sid".to_string()]);
        assert_eq!(config.forum.headers["X-Bot-Secret"], "s3cret");
        assert_eq!(config.retention.keep, 5);
        assert_eq!(config.storage.backend, StorageBackend::Json);
        assert_eq!(config.forum.selectors, ListingSelectors::default());
    }

    #[test]
    fn toml_round_trip_keeps_values() {
        let mut config = Config::default();
        config.calendar.utc_offset_hours = -5;
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.calendar.utc_offset_hours, -5);
        assert_eq!(parsed.messages.week_empty, "本週沒有新文章");
    }

    #[test]
    fn storage_path_defaults_per_backend() {
        let sqlite = StorageConfig::default();
        assert_eq!(sqlite.resolved_path(), PathBuf::from("data/articles.db"));

        let json: StorageConfig = toml::from_str(r#"backend = "json""#).unwrap();
        assert_eq!(json.path, None);
        assert_eq!(json.resolved_path(), PathBuf::from("data"));

        let custom = StorageConfig::new(StorageBackend::Json, "/var/lib/forum-watch");
        assert_eq!(custom.resolved_path(), PathBuf::from("/var/lib/forum-watch"));
    }

    #[test]
    fn validate_rejects_json_backend_on_db_file() {
        let mut config = Config::default();
        config.storage = StorageConfig::new(StorageBackend::Json, "data/articles.db");
        assert!(matches!(config.validate(), Err(AppError::Validation(_))));

        config.storage.path = None;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_or_default_uses_defaults_only_when_missing() {
        let tmp = tempfile::TempDir::new().unwrap();

        let missing = Config::load_or_default(tmp.path().join("config.toml")).unwrap();
        assert_eq!(missing.retention.keep, 20);

        let path = tmp.path().join("bad.toml");
        fs::write(&path, "[retention]\nkeep = \"twenty\"\n").unwrap();
        assert!(matches!(
            Config::load_or_default(&path),
            Err(AppError::Toml(_))
        ));

        fs::write(&path, "[retention]\nkeep = 5\n").unwrap();
        assert_eq!(Config::load_or_default(&path).unwrap().retention.keep, 5);
    }
}
