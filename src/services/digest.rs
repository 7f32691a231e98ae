//! Subscriber-facing message rendering.
//!
//! Builds the text of the weekly digest, the new-article notification and
//! the store overview. Delivery is left to the caller.

use chrono::NaiveDate;

use crate::models::{Article, MessagesConfig};

/// Renders messages from configured templates.
pub struct DigestFormatter<'a> {
    messages: &'a MessagesConfig,
}

impl<'a> DigestFormatter<'a> {
    pub fn new(messages: &'a MessagesConfig) -> Self {
        Self { messages }
    }

    /// Articles of the week between `monday` and `sunday`.
    pub fn week_digest(&self, monday: NaiveDate, sunday: NaiveDate, articles: &[Article]) -> String {
        if articles.is_empty() {
            return self.messages.week_empty.clone();
        }

        let header = self
            .messages
            .week_header
            .replace("{start}", &monday.format("%m/%d").to_string())
            .replace("{end}", &sunday.format("%m/%d").to_string());

        std::iter::once(header)
            .chain(articles.iter().map(|a| a.format(&self.messages.week_line)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Notification for freshly persisted articles, `None` when there are none.
    pub fn new_articles_message(&self, articles: &[Article]) -> Option<String> {
        if articles.is_empty() {
            return None;
        }

        let header = self
            .messages
            .new_header
            .replace("{count}", &articles.len().to_string());

        Some(
            std::iter::once(header)
                .chain(articles.iter().map(|a| a.format(&self.messages.new_line)))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    /// Overview of the newest stored articles out of `total`.
    pub fn store_overview(&self, total: usize, articles: &[Article]) -> String {
        if articles.is_empty() {
            return self.messages.store_empty.clone();
        }

        let header = self
            .messages
            .store_header
            .replace("{total}", &total.to_string())
            .replace("{shown}", &articles.len().to_string());

        std::iter::once(header)
            .chain(articles.iter().map(|a| a.format(&self.messages.store_line)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
