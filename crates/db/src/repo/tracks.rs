use cinedex_core::types::SubtitleSource;
use sqlx::{SqliteConnection, SqliteExecutor};

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct AudioTrackRow {
    pub id: String,
    pub media_file_id: String,
    pub stream_index: i64,
    pub codec: String,
    pub channels: i64,
    pub language: Option<String>,
    pub title: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct SubtitleTrackRow {
    pub id: String,
    pub media_file_id: String,
    pub source: String,
    pub external_path: Option<String>,
    pub stream_index: Option<i64>,
    pub language: Option<String>,
    pub format: String,
    pub title: Option<String>,
    pub is_forced: bool,
    pub is_default: bool,
}

#[derive(Debug, Clone)]
pub struct NewAudioTrack {
    pub stream_index: i64,
    pub codec: String,
    pub channels: i64,
    pub language: Option<String>,
    pub title: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone)]
pub struct NewSubtitleTrack {
    pub source: SubtitleSource,
    pub external_path: Option<String>,
    pub stream_index: Option<i64>,
    pub language: Option<String>,
    pub format: String,
    pub title: Option<String>,
    pub is_forced: bool,
    pub is_default: bool,
}

/// Drop every audio row of a file and insert the given ones.
pub async fn replace_audio_tracks(
    conn: &mut SqliteConnection,
    media_file_id: &str,
    tracks: &[NewAudioTrack],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM audio_track WHERE media_file_id = ?")
        .bind(media_file_id)
        .execute(&mut *conn)
        .await?;

    for t in tracks {
        sqlx::query(
            "INSERT INTO audio_track (id, media_file_id, stream_index, codec, channels, \
             language, title, is_default) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(media_file_id)
        .bind(t.stream_index)
        .bind(&t.codec)
        .bind(t.channels)
        .bind(&t.language)
        .bind(&t.title)
        .bind(t.is_default)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Drop every subtitle row of a file, embedded and external, and insert the given ones.
pub async fn replace_subtitle_tracks(
    conn: &mut SqliteConnection,
    media_file_id: &str,
    tracks: &[NewSubtitleTrack],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM subtitle_track WHERE media_file_id = ?")
        .bind(media_file_id)
        .execute(&mut *conn)
        .await?;

    for t in tracks {
        sqlx::query(
            "INSERT INTO subtitle_track (id, media_file_id, source, external_path, \
             stream_index, language, format, title, is_forced, is_default) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(media_file_id)
        .bind(t.source.as_str())
        .bind(&t.external_path)
        .bind(t.stream_index)
        .bind(&t.language)
        .bind(&t.format)
        .bind(&t.title)
        .bind(t.is_forced)
        .bind(t.is_default)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn list_audio_tracks<'e, E>(
    exec: E,
    media_file_id: &str,
) -> Result<Vec<AudioTrackRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, media_file_id, stream_index, codec, channels, language, title, is_default \
         FROM audio_track WHERE media_file_id = ? ORDER BY stream_index",
    )
    .bind(media_file_id)
    .fetch_all(exec)
    .await
}

/// Embedded tracks first (by stream index), then external ones by path.
pub async fn list_subtitle_tracks<'e, E>(
    exec: E,
    media_file_id: &str,
) -> Result<Vec<SubtitleTrackRow>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as(
        "SELECT id, media_file_id, source, external_path, stream_index, language, format, \
         title, is_forced, is_default FROM subtitle_track WHERE media_file_id = ? \
         ORDER BY source, stream_index, external_path",
    )
    .bind(media_file_id)
    .fetch_all(exec)
    .await
}
