use anyhow::Context;

use crate::db::DbPool;
use crate::error::Result;

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub like_counts_repaired: usize,
    pub comment_counts_repaired: usize,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.like_counts_repaired == 0 && self.comment_counts_repaired == 0
    }
}

/// Recompute denormalized counters from their backing rows and repair
/// any drift.
///
/// The mutation paths keep counters and rows in one transaction, so
/// this normally repairs nothing; it exists for the day a
/// non-transactional code path (or a crash mid-migration) lets them
/// diverge. Intended to run periodically from a scheduler.
pub fn reconcile_counters(pool: &DbPool) -> Result<ReconciliationReport> {
    let conn = pool.get()?;

    let like_counts_repaired = conn
        .execute(
            "UPDATE posts
             SET like_count = (SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.id)
             WHERE like_count <> (SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.id)",
            [],
        )
        .context("Failed to reconcile like counts")?;

    let comment_counts_repaired = conn
        .execute(
            "UPDATE posts
             SET comment_count = (SELECT COUNT(*) FROM posts AS children
                                  WHERE children.parent_post_id = posts.id)
             WHERE comment_count <> (SELECT COUNT(*) FROM posts AS children
                                     WHERE children.parent_post_id = posts.id)",
            [],
        )
        .context("Failed to reconcile comment counts")?;

    let report = ReconciliationReport {
        like_counts_repaired,
        comment_counts_repaired,
    };
    if report.is_clean() {
        tracing::debug!("engagement counters consistent");
    } else {
        tracing::warn!(
            like_counts = like_counts_repaired,
            comment_counts = comment_counts_repaired,
            "repaired drifted engagement counters"
        );
    }
    Ok(report)
}
