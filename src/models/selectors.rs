// src/models/selectors.rs

//! CSS selectors for scraping the forum listing.

use serde::{Deserialize, Serialize};

/// CSS selectors describing the listing's row/title markup convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingSelectors {
    /// Selector for each topic row in the listing
    #[serde(default = "default_row_selector")]
    pub row_selector: String,

    /// Selector for the title link within a row
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_attr_name")]
    pub attr_name: String,
}

fn default_row_selector() -> String {
    "li.row".to_string()
}

fn default_title_selector() -> String {
    "a.topictitle".to_string()
}

fn default_attr_name() -> String {
    "href".to_string()
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row_selector: default_row_selector(),
            title_selector: default_title_selector(),
            attr_name: default_attr_name(),
        }
    }
}

impl ListingSelectors {
    /// Create selectors for a different board engine.
    pub fn new(row: impl Into<String>, title: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            row_selector: row.into(),
            title_selector: title.into(),
            attr_name: attr.into(),
        }
    }
}
