//! Service layer for the forum watcher.
//!
//! This module contains the business logic for:
//! - Listing fetching and row extraction (`ForumCrawler`, `ListingParser`)
//! - Subscriber message rendering (`DigestFormatter`)

mod digest;
mod listing;

pub use digest::DigestFormatter;
pub use listing::{ForumCrawler, HttpFetcher, ListingParser, ListingRow, PageFetcher};
