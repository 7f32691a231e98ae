//! Pipeline entry points for watcher operations.
//!
//! - `run_scrape_pipeline`: Fetch the listing, persist new topics, apply retention
//! - `select_current_week`: Read this week's articles

pub mod novelty;
pub mod retention;
pub mod scrape;
pub mod week;

pub use novelty::{ItemOutcome, persist_new};
pub use retention::apply_retention;
pub use scrape::{ScrapeReport, ScrapeStats, run_scrape_pipeline};
pub use week::{select_current_week, week_bounds};
