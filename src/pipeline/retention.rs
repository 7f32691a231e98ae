// src/pipeline/retention.rs

//! Bounded history: keep only the newest articles.

use crate::error::Result;
use crate::storage::ArticleStore;

/// Evict everything beyond the `keep` newest articles.
///
/// Returns the number of evicted articles; a store at or below the cap is
/// left untouched.
pub async fn apply_retention(store: &dyn ArticleStore, keep: usize) -> Result<usize> {
    let total = store.count().await?;
    if total <= keep {
        log::debug!("Retention: {total} article(s) stored, cap {keep}, nothing to evict");
        return Ok(0);
    }

    let evicted = store.delete_oldest_beyond(keep).await?;
    log::info!("Retention: evicted {evicted} article(s), kept {keep}");
    Ok(evicted)
}
