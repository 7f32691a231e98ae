// src/services/listing.rs

//! Forum listing crawler service.
//!
//! Fetches the configured listing page once and extracts topic rows using
//! the configured CSS selectors.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Candidate, ForumConfig, ListingSelectors};
use crate::utils::collapse_whitespace;
use crate::utils::http::create_async_client;

/// Source of listing page bodies.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the decoded body.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Fetcher backed by a configured reqwest client. One attempt per call.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ForumConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// One row of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingRow {
    /// A row with a title link
    Topic(Candidate),
    /// A row without a usable title link
    Malformed,
}

impl ListingRow {
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Self::Topic(candidate) => Some(candidate),
            Self::Malformed => None,
        }
    }
}

/// Extracts topic rows from listing markup.
#[derive(Debug, Clone)]
pub struct ListingParser {
    row_sel: Selector,
    title_sel: Selector,
    attr_name: String,
}

impl ListingParser {
    pub fn new(selectors: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            row_sel: parse_selector(&selectors.row_selector)?,
            title_sel: parse_selector(&selectors.title_selector)?,
            attr_name: selectors.attr_name.clone(),
        })
    }

    /// Parse every row in document order.
    pub fn parse(&self, html: &str) -> Vec<ListingRow> {
        let document = Html::parse_document(html);
        document
            .select(&self.row_sel)
            .map(|row| match self.parse_row(&row) {
                Some(candidate) => ListingRow::Topic(candidate),
                None => ListingRow::Malformed,
            })
            .collect()
    }

    fn parse_row(&self, row: &ElementRef) -> Option<Candidate> {
        let title_elem = row.select(&self.title_sel).next()?;
        let title = collapse_whitespace(&title_elem.text().collect::<String>());
        let href = title_elem.value().attr(&self.attr_name)?.trim();

        if title.is_empty() || href.is_empty() {
            return None;
        }
        Some(Candidate::new(title, href))
    }
}

/// Service for crawling the forum listing.
pub struct ForumCrawler {
    listing_url: String,
    fetcher: Arc<dyn PageFetcher>,
    parser: ListingParser,
}

impl ForumCrawler {
    /// Create a crawler that fetches through `fetcher`.
    pub fn new(config: &ForumConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        Ok(Self {
            listing_url: config.listing_url.clone(),
            fetcher,
            parser: ListingParser::new(&config.selectors)?,
        })
    }

    /// Create a crawler that fetches over HTTP.
    pub fn from_config(config: &ForumConfig) -> Result<Self> {
        Self::new(config, Arc::new(HttpFetcher::new(config)?))
    }

    /// Fetch the listing and return every row, malformed ones included.
    pub async fn fetch_rows(&self) -> Result<Vec<ListingRow>> {
        log::info!("Fetching listing {}", self.listing_url);
        let body = self.fetcher.fetch_text(&self.listing_url).await?;
        let rows = self.parser.parse(&body);
        log::debug!("Listing has {} row(s)", rows.len());
        Ok(rows)
    }

    /// Fetch the listing and return only rows with a title link.
    pub async fn fetch_candidates(&self) -> Result<Vec<Candidate>> {
        let rows = self.fetch_rows().await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row {
                ListingRow::Topic(candidate) => Some(candidate),
                ListingRow::Malformed => None,
            })
            .collect())
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
        <ul class="topiclist topics">
          <li class="row bg1">
            <dl><dt><div class="list-inner">
              <a href="./viewtopic.php?f=2&amp;t=101&amp;sid=abc" class="topictitle">12/9 (Tue.)
                Topic A</a>
            </div></dt></dl>
          </li>
          <li class="row bg2">
            <dl><dt><span class="notice">No link in this row</span></dt></dl>
          </li>
          <li class="row bg1">
            <a href="./viewtopic.php?f=2&amp;t=103" class="topictitle">12/10 (Wed.) Topic B</a>
          </li>
          <li class="header"><a class="topictitle" href="./ignored.php">not a row</a></li>
        </ul>
        </body></html>
    "#;

    struct StaticPage(&'static str);

    #[async_trait]
    impl PageFetcher for StaticPage {
        async fn fetch_text(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Unavailable;

    #[async_trait]
    impl PageFetcher for Unavailable {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            Err(AppError::HttpStatus {
                url: url.to_string(),
                status: 503,
            })
        }
    }

    #[test]
    fn test_parse_rows_in_order() {
        let parser = ListingParser::new(&ListingSelectors::default()).unwrap();
        let rows = parser.parse(LISTING);

        assert_eq!(
            rows,
            vec![
                ListingRow::Topic(Candidate::new(
                    "12/9 (Tue.) Topic A",
                    "./viewtopic.php?f=2&t=101&sid=abc"
                )),
                ListingRow::Malformed,
                ListingRow::Topic(Candidate::new(
                    "12/10 (Wed.) Topic B",
                    "./viewtopic.php?f=2&t=103"
                )),
            ]
        );
    }

    #[test]
    fn test_parse_page_without_rows() {
        let parser = ListingParser::new(&ListingSelectors::default()).unwrap();
        assert!(parser.parse("<html><body><p>Board is empty</p></body></html>").is_empty());
        assert!(parser.parse("").is_empty());
    }

    #[test]
    fn test_row_with_empty_title_is_malformed() {
        let parser = ListingParser::new(&ListingSelectors::default()).unwrap();
        let rows = parser.parse(
            r#"<ul><li class="row"><a class="topictitle" href="./viewtopic.php?t=1">  </a></li>
               <li class="row"><a class="topictitle">12/9 (Tue.) no href</a></li></ul>"#,
        );
        assert_eq!(rows, vec![ListingRow::Malformed, ListingRow::Malformed]);
    }

    #[test]
    fn test_custom_selectors() {
        let selectors = ListingSelectors::new("tr.topic", "td.subject a", "href");
        let parser = ListingParser::new(&selectors).unwrap();
        let rows = parser.parse(
            r#"<table><tr class="topic"><td class="subject"><a href="/t/1">1/5 (Sun.) Hello</a></td></tr></table>"#,
        );
        assert_eq!(
            rows[0].candidate(),
            Some(&Candidate::new("1/5 (Sun.) Hello", "/t/1"))
        );
    }

    #[test]
    fn test_parse_selector_invalid() {
        let selectors = ListingSelectors::new("[[invalid", "a", "href");
        assert!(ListingParser::new(&selectors).is_err());
    }

    #[tokio::test]
    async fn test_fetch_candidates_skips_malformed() {
        let crawler = ForumCrawler::new(&ForumConfig::default(), Arc::new(StaticPage(LISTING)))
            .unwrap();
        let candidates = crawler.fetch_candidates().await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].title, "12/10 (Wed.) Topic B");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_propagated() {
        let crawler =
            ForumCrawler::new(&ForumConfig::default(), Arc::new(Unavailable)).unwrap();
        let err = crawler.fetch_rows().await.unwrap_err();
        assert!(err.is_fetch_failure());
    }
}
