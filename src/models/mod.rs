// src/models/mod.rs

//! Domain models for the forum watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod article;
mod config;
mod selectors;

// Re-export all public types
pub use article::{Article, Candidate, NewArticle};
pub use config::{
    CalendarConfig, Config, ForumConfig, MessagesConfig, RetentionConfig, StorageBackend,
    StorageConfig,
};
pub use selectors::ListingSelectors;
