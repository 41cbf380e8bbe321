use sqlx::{SqliteConnection, SqliteExecutor};

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct MediaFileRow {
    pub id: String,
    pub library_id: String,
    pub movie_id: Option<String>,
    pub episode_id: Option<String>,
    pub path: String,
    pub size_bytes: i64,
    pub hash: String,
    pub container: Option<String>,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    pub video_width: Option<i64>,
    pub video_height: Option<i64>,
    pub audio_channels: Option<i64>,
    pub duration_sec: i64,
    pub last_seen_us: Option<i64>,
    pub is_missing: bool,
    pub missing_since_us: Option<i64>,
    pub created_ts: i64,
    pub updated_ts: i64,
}

/// Column values written on both first insert and every later update.
#[derive(Debug, Clone)]
pub struct MediaFileWrite<'a> {
    pub library_id: &'a str,
    pub movie_id: Option<&'a str>,
    pub episode_id: Option<&'a str>,
    pub path: &'a str,
    pub size_bytes: i64,
    pub hash: &'a str,
    pub container: Option<&'a str>,
    pub video_codec: Option<&'a str>,
    pub audio_codec: Option<&'a str>,
    pub video_width: Option<i64>,
    pub video_height: Option<i64>,
    pub audio_channels: Option<i64>,
    pub duration_sec: i64,
    pub seen_us: i64,
}

pub async fn get_media_file<'e, E>(
    exec: E,
    file_id: &str,
) -> Result<Option<MediaFileRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, library_id, movie_id, episode_id, path, size_bytes, hash, container, \
         video_codec, audio_codec, video_width, video_height, audio_channels, duration_sec, \
         last_seen_us, is_missing, missing_since_us, created_ts, updated_ts \
         FROM media_file WHERE id = ?",
    )
    .bind(file_id)
    .fetch_optional(exec)
    .await
}

/// Look up a file by path within one library. The same path may be
/// catalogued independently by libraries whose roots overlap.
pub async fn get_media_file_by_path<'e, E>(
    exec: E,
    library_id: &str,
    path: &str,
) -> Result<Option<MediaFileRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, library_id, movie_id, episode_id, path, size_bytes, hash, container, \
         video_codec, audio_codec, video_width, video_height, audio_channels, duration_sec, \
         last_seen_us, is_missing, missing_since_us, created_ts, updated_ts \
         FROM media_file WHERE library_id = ? AND path = ?",
    )
    .bind(library_id)
    .bind(path)
    .fetch_optional(exec)
    .await
}

pub async fn list_media_files<'e, E>(
    exec: E,
    library_id: &str,
) -> Result<Vec<MediaFileRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, library_id, movie_id, episode_id, path, size_bytes, hash, container, \
         video_codec, audio_codec, video_width, video_height, audio_channels, duration_sec, \
         last_seen_us, is_missing, missing_since_us, created_ts, updated_ts \
         FROM media_file WHERE library_id = ? ORDER BY path",
    )
    .bind(library_id)
    .fetch_all(exec)
    .await
}

/// Insert a new media file row and return its id.
pub async fn insert_media_file<'e, E>(
    exec: E,
    mf: &MediaFileWrite<'_>,
) -> Result<String, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO media_file (id, library_id, movie_id, episode_id, path, size_bytes, hash, \
         container, video_codec, audio_codec, video_width, video_height, audio_channels, \
         duration_sec, last_seen_us, is_missing, missing_since_us, created_ts, updated_ts) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, ?, ?)",
    )
    .bind(&id)
    .bind(mf.library_id)
    .bind(mf.movie_id)
    .bind(mf.episode_id)
    .bind(mf.path)
    .bind(mf.size_bytes)
    .bind(mf.hash)
    .bind(mf.container)
    .bind(mf.video_codec)
    .bind(mf.audio_codec)
    .bind(mf.video_width)
    .bind(mf.video_height)
    .bind(mf.audio_channels)
    .bind(mf.duration_sec)
    .bind(mf.seen_us)
    .bind(now)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(id)
}

/// Overwrite an existing row in place, keeping its id, library and
/// `created_ts`. Returns `false` when no row with that id belongs to
/// `mf.library_id`.
///
/// Also clears the missing flags, since the file was just observed on disk.
pub async fn update_media_file<'e, E>(
    exec: E,
    file_id: &str,
    mf: &MediaFileWrite<'_>,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "UPDATE media_file SET movie_id = ?, episode_id = ?, size_bytes = ?, \
         hash = ?, container = ?, video_codec = ?, audio_codec = ?, video_width = ?, \
         video_height = ?, audio_channels = ?, duration_sec = ?, last_seen_us = ?, \
         is_missing = 0, missing_since_us = NULL, updated_ts = ? \
         WHERE id = ? AND library_id = ?",
    )
    .bind(mf.movie_id)
    .bind(mf.episode_id)
    .bind(mf.size_bytes)
    .bind(mf.hash)
    .bind(mf.container)
    .bind(mf.video_codec)
    .bind(mf.audio_codec)
    .bind(mf.video_width)
    .bind(mf.video_height)
    .bind(mf.audio_channels)
    .bind(mf.duration_sec)
    .bind(mf.seen_us)
    .bind(now)
    .bind(file_id)
    .bind(mf.library_id)
    .execute(exec)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Record that a known file was observed during the current walk.
pub async fn mark_media_file_seen<'e, E>(
    exec: E,
    file_id: &str,
    seen_us: i64,
) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let now = chrono::Utc::now().timestamp();
    sqlx::query(
        "UPDATE media_file SET last_seen_us = ?, is_missing = 0, missing_since_us = NULL, \
         updated_ts = ? WHERE id = ?",
    )
    .bind(seen_us)
    .bind(now)
    .bind(file_id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Replace the multi-episode link rows of a file with one row per episode,
/// inserted in the given order.
pub async fn replace_episode_links(
    conn: &mut SqliteConnection,
    media_file_id: &str,
    episode_ids: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM media_file_episode WHERE media_file_id = ?")
        .bind(media_file_id)
        .execute(&mut *conn)
        .await?;

    let now = chrono::Utc::now().timestamp();
    for episode_id in episode_ids {
        sqlx::query(
            "INSERT INTO media_file_episode (id, media_file_id, episode_id, created_ts) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(media_file_id)
        .bind(episode_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}
