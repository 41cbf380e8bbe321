//! Series → Season → Episode tree.
//!
//! Rows are created lazily by the scanner, one level at a time, and only as
//! deep as a file requires. Lookups always take the parent id so a season or
//! episode can never be resolved under the wrong ancestor.

use sqlx::SqliteExecutor;

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct SeriesRow {
    pub id: String,
    pub library_id: String,
    pub title: String,
    pub original_title: String,
    pub overview: Option<String>,
    pub status: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub created_ts: i64,
    pub updated_ts: i64,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct SeasonRow {
    pub id: String,
    pub series_id: String,
    pub number: i64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub created_ts: i64,
    pub updated_ts: i64,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct EpisodeRow {
    pub id: String,
    pub season_id: String,
    pub number: i64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub runtime_min: i64,
    pub still_path: Option<String>,
    pub created_ts: i64,
    pub updated_ts: i64,
}

// ─── Series ──────────────────────────────────────────────────────────────────

pub async fn find_series<'e, E>(
    exec: E,
    library_id: &str,
    title: &str,
) -> Result<Option<SeriesRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, library_id, title, original_title, overview, status, poster_path, \
         backdrop_path, created_ts, updated_ts FROM series WHERE library_id = ? AND title = ?",
    )
    .bind(library_id)
    .bind(title)
    .fetch_optional(exec)
    .await
}

pub async fn create_series<'e, E>(
    exec: E,
    library_id: &str,
    title: &str,
) -> Result<SeriesRow, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO series (id, library_id, title, original_title, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(library_id)
    .bind(title)
    .bind(title)
    .bind(now)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(SeriesRow {
        id,
        library_id: library_id.to_string(),
        title: title.to_string(),
        original_title: title.to_string(),
        overview: None,
        status: None,
        poster_path: None,
        backdrop_path: None,
        created_ts: now,
        updated_ts: now,
    })
}

pub async fn get_series<'e, E>(exec: E, series_id: &str) -> Result<Option<SeriesRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, library_id, title, original_title, overview, status, poster_path, \
         backdrop_path, created_ts, updated_ts FROM series WHERE id = ?",
    )
    .bind(series_id)
    .fetch_optional(exec)
    .await
}

pub async fn list_series<'e, E>(exec: E, library_id: &str) -> Result<Vec<SeriesRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, library_id, title, original_title, overview, status, poster_path, \
         backdrop_path, created_ts, updated_ts FROM series WHERE library_id = ? ORDER BY title",
    )
    .bind(library_id)
    .fetch_all(exec)
    .await
}

// ─── Seasons ─────────────────────────────────────────────────────────────────

pub async fn find_season<'e, E>(
    exec: E,
    series_id: &str,
    number: i64,
) -> Result<Option<SeasonRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, series_id, number, title, overview, poster_path, created_ts, updated_ts \
         FROM season WHERE series_id = ? AND number = ?",
    )
    .bind(series_id)
    .bind(number)
    .fetch_optional(exec)
    .await
}

pub async fn create_season<'e, E>(
    exec: E,
    series_id: &str,
    number: i64,
) -> Result<SeasonRow, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO season (id, series_id, number, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(series_id)
    .bind(number)
    .bind(now)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(SeasonRow {
        id,
        series_id: series_id.to_string(),
        number,
        title: None,
        overview: None,
        poster_path: None,
        created_ts: now,
        updated_ts: now,
    })
}

pub async fn get_season<'e, E>(exec: E, season_id: &str) -> Result<Option<SeasonRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, series_id, number, title, overview, poster_path, created_ts, updated_ts \
         FROM season WHERE id = ?",
    )
    .bind(season_id)
    .fetch_optional(exec)
    .await
}

pub async fn list_seasons<'e, E>(exec: E, series_id: &str) -> Result<Vec<SeasonRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, series_id, number, title, overview, poster_path, created_ts, updated_ts \
         FROM season WHERE series_id = ? ORDER BY number",
    )
    .bind(series_id)
    .fetch_all(exec)
    .await
}

// ─── Episodes ────────────────────────────────────────────────────────────────

pub async fn find_episode<'e, E>(
    exec: E,
    season_id: &str,
    number: i64,
) -> Result<Option<EpisodeRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, season_id, number, title, overview, runtime_min, still_path, \
         created_ts, updated_ts FROM episode WHERE season_id = ? AND number = ?",
    )
    .bind(season_id)
    .bind(number)
    .fetch_optional(exec)
    .await
}

pub async fn create_episode<'e, E>(
    exec: E,
    season_id: &str,
    number: i64,
) -> Result<EpisodeRow, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO episode (id, season_id, number, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(season_id)
    .bind(number)
    .bind(now)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(EpisodeRow {
        id,
        season_id: season_id.to_string(),
        number,
        title: None,
        overview: None,
        runtime_min: 0,
        still_path: None,
        created_ts: now,
        updated_ts: now,
    })
}

pub async fn get_episode<'e, E>(exec: E, episode_id: &str) -> Result<Option<EpisodeRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, season_id, number, title, overview, runtime_min, still_path, \
         created_ts, updated_ts FROM episode WHERE id = ?",
    )
    .bind(episode_id)
    .fetch_optional(exec)
    .await
}

pub async fn list_episodes<'e, E>(exec: E, season_id: &str) -> Result<Vec<EpisodeRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, season_id, number, title, overview, runtime_min, still_path, \
         created_ts, updated_ts FROM episode WHERE season_id = ? ORDER BY number",
    )
    .bind(season_id)
    .fetch_all(exec)
    .await
}

/// Episodes linked to a media file through `media_file_episode`, in
/// season/episode order.
pub async fn list_episodes_for_media_file<'e, E>(
    exec: E,
    media_file_id: &str,
) -> Result<Vec<EpisodeRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT e.id, e.season_id, e.number, e.title, e.overview, e.runtime_min, \
         e.still_path, e.created_ts, e.updated_ts \
         FROM media_file_episode mfe \
         JOIN episode e ON e.id = mfe.episode_id \
         JOIN season s ON s.id = e.season_id \
         WHERE mfe.media_file_id = ? \
         ORDER BY s.number, e.number",
    )
    .bind(media_file_id)
    .fetch_all(exec)
    .await
}
