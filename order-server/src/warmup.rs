//! Startup cache warm-up
//!
//! Loads the most recently created orders into the cache before the HTTP
//! surface starts serving. Never fails: problems are logged and skipped.

use crate::cache::OrderCache;
use crate::db::OrderStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmupReport {
    /// Identifiers returned by the recency query
    pub requested: usize,
    pub loaded: usize,
    pub skipped: usize,
}

/// Populate `cache` with up to `limit` of the newest orders
pub async fn warm_up_cache(store: &OrderStore, cache: &OrderCache, limit: usize) -> WarmupReport {
    let mut report = WarmupReport::default();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let ids = match store.recent_order_ids(limit).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, "Cache warm-up query failed");
            return report;
        }
    };
    report.requested = ids.len();

    for id in ids {
        match store.get_order_by_id(&id).await {
            Ok(order) => {
                cache.set(id, order);
                report.loaded += 1;
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(order_id = %id, "warm-up skip: order no longer present");
                report.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(order_id = %id, error = %e, "warm-up skip");
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        requested = report.requested,
        loaded = report.loaded,
        skipped = report.skipped,
        cache_len = cache.len(),
        "Cache warm-up finished"
    );
    report
}
