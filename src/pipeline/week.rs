// src/pipeline/week.rs

//! Current-week article selection.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::Result;
use crate::models::Article;
use crate::storage::ArticleStore;

/// Monday and Sunday of the week containing `today`.
pub fn week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(6))
}

/// Articles dated Monday through Sunday of the current week, oldest first.
pub async fn select_current_week(store: &dyn ArticleStore, today: NaiveDate) -> Result<Vec<Article>> {
    let (monday, sunday) = week_bounds(today);
    store.select_by_date_range(monday, sunday).await
}
