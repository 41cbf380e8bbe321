//! Reconciliation Sweep: brings the catalog in line with what the walk saw.
//!
//! Steps run in a fixed order and each one is attempted even when an earlier
//! one failed. Per-file work committed during the walk is never undone here.

use std::time::Duration;

use cinedex_db::UnitOfWork;
use cinedex_db::repo::reconcile;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::ScanIssue;

/// Row counts touched by one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub marked_missing: u64,
    pub unlinked: u64,
    pub episodes_deleted: u64,
    pub seasons_deleted: u64,
    pub series_deleted: u64,
    pub purged: u64,
}

/// Run the sweep for one library.
///
/// `scan_started_us` is the walk's start time: anything not seen since then
/// is missing. With a `retention`, files missing for longer are purged.
pub async fn sweep(
    pool: &SqlitePool,
    library_id: &str,
    scan_started_us: i64,
    retention: Option<Duration>,
) -> (SweepReport, Vec<ScanIssue>) {
    let mut issues = Vec::new();

    let marked_missing = record(
        "mark missing media files",
        reconcile::mark_missing_media_files(pool, library_id, scan_started_us).await,
        &mut issues,
    );

    let unlinked = record(
        "unlink missing media files",
        unlink_missing(pool, library_id).await,
        &mut issues,
    );

    // Leaf to root.
    let episodes_deleted = record(
        "delete orphan episodes",
        reconcile::delete_orphan_episodes(pool, library_id).await,
        &mut issues,
    );
    let seasons_deleted = record(
        "delete orphan seasons",
        reconcile::delete_orphan_seasons(pool, library_id).await,
        &mut issues,
    );
    let series_deleted = record(
        "delete orphan series",
        reconcile::delete_orphan_series(pool, library_id).await,
        &mut issues,
    );

    let mut purged = 0;
    if let Some(retention) = retention {
        let cutoff = cinedex_db::now_us().saturating_sub(retention.as_micros() as i64);
        purged = record(
            "purge missing media files",
            reconcile::purge_missing_media_files(pool, library_id, cutoff).await,
            &mut issues,
        );
    }

    let report = SweepReport {
        marked_missing,
        unlinked,
        episodes_deleted,
        seasons_deleted,
        series_deleted,
        purged,
    };

    info!(
        library_id = library_id,
        marked_missing = report.marked_missing,
        episodes_deleted = report.episodes_deleted,
        seasons_deleted = report.seasons_deleted,
        series_deleted = report.series_deleted,
        purged = report.purged,
        "reconciliation sweep finished"
    );

    (report, issues)
}

/// The link delete and the reference clear land together or not at all.
async fn unlink_missing(pool: &SqlitePool, library_id: &str) -> Result<u64, sqlx::Error> {
    let mut uow = UnitOfWork::begin(pool).await?;
    let n = reconcile::unlink_missing_media_files(uow.conn(), library_id).await?;
    uow.commit().await?;
    Ok(n)
}

fn record(step: &str, result: Result<u64, sqlx::Error>, issues: &mut Vec<ScanIssue>) -> u64 {
    match result {
        Ok(n) => n,
        Err(e) => {
            warn!(step = step, error = %e, "sweep step failed");
            issues.push(ScanIssue::sweep(step, &e));
            0
        }
    }
}
