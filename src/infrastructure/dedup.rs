//! Cross-page review dedup.
//!
//! Stalled pagination and re-rendered pages can hand the same review to the
//! harvester more than once. Records are deduplicated on the
//! (written_at, body_text) pair after pagination completes, keeping the
//! first occurrence so visit order survives.

use std::collections::HashSet;

use tracing::info;

use crate::domain::record::ReviewRecord;

/// Drop repeated reviews, preserving first-seen order.
pub fn dedup_reviews(records: Vec<ReviewRecord>) -> Vec<ReviewRecord> {
    let before = records.len();
    let mut seen = HashSet::new();
    let deduped: Vec<ReviewRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.dedup_key()))
        .collect();
    if deduped.len() < before {
        info!(
            before,
            after = deduped.len(),
            "dropped duplicate reviews harvested across pages"
        );
    }
    deduped
}
