//! Post-walk reconciliation queries, scoped to one library.
//!
//! The orphan deletes must run leaf to root (episodes, seasons, series):
//! each parent's emptiness check only holds once its children were pruned.

use sqlx::{SqliteConnection, SqliteExecutor};

/// Flag files not seen since `scan_started_us` as missing.
///
/// `missing_since_us` is only set the first time, so repeated sweeps keep the
/// original disappearance time.
pub async fn mark_missing_media_files<'e, E>(
    exec: E,
    library_id: &str,
    scan_started_us: i64,
) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "UPDATE media_file SET is_missing = 1, \
         missing_since_us = COALESCE(missing_since_us, ?), updated_ts = ? \
         WHERE library_id = ? AND is_missing = 0 \
         AND (last_seen_us IS NULL OR last_seen_us < ?)",
    )
    .bind(scan_started_us)
    .bind(now)
    .bind(library_id)
    .bind(scan_started_us)
    .execute(exec)
    .await?;
    Ok(result.rows_affected())
}

/// Detach missing files from the catalog tree: delete their episode link
/// rows, then null their movie/episode references. The file rows stay.
///
/// Returns the number of files whose direct references were cleared.
pub async fn unlink_missing_media_files(
    conn: &mut SqliteConnection,
    library_id: &str,
) -> Result<u64, sqlx::Error> {
    sqlx::query(
        "DELETE FROM media_file_episode WHERE media_file_id IN \
         (SELECT id FROM media_file WHERE library_id = ? AND is_missing = 1)",
    )
    .bind(library_id)
    .execute(&mut *conn)
    .await?;

    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "UPDATE media_file SET movie_id = NULL, episode_id = NULL, updated_ts = ? \
         WHERE library_id = ? AND is_missing = 1 \
         AND (movie_id IS NOT NULL OR episode_id IS NOT NULL)",
    )
    .bind(now)
    .bind(library_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected())
}

/// Delete episodes with no present media file, through either the link
/// table or a direct `episode_id` reference.
pub async fn delete_orphan_episodes<'e, E>(exec: E, library_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM episode WHERE id IN ( \
           SELECT e.id FROM episode e \
           JOIN season s ON s.id = e.season_id \
           JOIN series sr ON sr.id = s.series_id \
           WHERE sr.library_id = ? \
           AND NOT EXISTS ( \
             SELECT 1 FROM media_file_episode mfe \
             JOIN media_file mf ON mf.id = mfe.media_file_id \
             WHERE mfe.episode_id = e.id AND mf.is_missing = 0) \
           AND NOT EXISTS ( \
             SELECT 1 FROM media_file mf \
             WHERE mf.episode_id = e.id AND mf.is_missing = 0))",
    )
    .bind(library_id)
    .execute(exec)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_orphan_seasons<'e, E>(exec: E, library_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM season WHERE id IN ( \
           SELECT s.id FROM season s \
           JOIN series sr ON sr.id = s.series_id \
           WHERE sr.library_id = ? \
           AND NOT EXISTS (SELECT 1 FROM episode e WHERE e.season_id = s.id))",
    )
    .bind(library_id)
    .execute(exec)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_orphan_series<'e, E>(exec: E, library_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM series WHERE library_id = ? \
         AND NOT EXISTS (SELECT 1 FROM season s WHERE s.series_id = series.id)",
    )
    .bind(library_id)
    .execute(exec)
    .await?;
    Ok(result.rows_affected())
}

/// Delete media files that have been missing since before `missing_before_us`.
/// Track and link rows go with them through `ON DELETE CASCADE`.
pub async fn purge_missing_media_files<'e, E>(
    exec: E,
    library_id: &str,
    missing_before_us: i64,
) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "DELETE FROM media_file WHERE library_id = ? AND is_missing = 1 \
         AND missing_since_us IS NOT NULL AND missing_since_us < ?",
    )
    .bind(library_id)
    .bind(missing_before_us)
    .execute(exec)
    .await?;
    Ok(result.rows_affected())
}
