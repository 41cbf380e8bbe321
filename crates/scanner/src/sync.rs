//! Catalog Synchronizer.
//!
//! Writes one processed file into the catalog: resolves or creates the movie
//! or the series → season → episode chain, upserts the media file row and
//! re-derives its link, audio and subtitle rows. Every lookup runs before
//! the matching insert on the same connection, so callers get idempotent
//! writes by running the whole call inside one [`cinedex_db::UnitOfWork`].

use std::path::Path;

use cinedex_core::types::{LibraryKind, SubtitleSource};
use cinedex_db::repo::{media_files, movies, series, tracks};
use cinedex_probe::MediaInfo;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::classify::{self, Classification, EpisodeGuess, MovieGuess};
use crate::subtitles::SidecarSubtitle;

/// Everything known about a file once it has been hashed and probed.
#[derive(Debug, Clone)]
pub struct FileFacts<'a> {
    pub library_id: &'a str,
    pub kind: LibraryKind,
    pub path: &'a Path,
    pub size_bytes: u64,
    pub hash: &'a str,
    pub info: &'a MediaInfo,
    pub sidecars: &'a [SidecarSubtitle],
    pub seen_us: i64,
}

/// What a sync call added to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub media_file_id: String,
    pub movie_added: bool,
    pub series_added: bool,
    pub episodes_added: usize,
}

#[derive(Debug, Default)]
struct Placement {
    movie_id: Option<String>,
    episode_ids: Vec<String>,
    movie_added: bool,
    series_added: bool,
    episodes_added: usize,
}

/// Synchronize one file. `existing_id` keeps the identity of a known record.
pub async fn sync_file(
    conn: &mut SqliteConnection,
    existing_id: Option<&str>,
    facts: &FileFacts<'_>,
) -> Result<SyncOutcome, sqlx::Error> {
    let placement = match classify::classify(facts.kind, facts.path) {
        Classification::Movie(guess) => place_movie(conn, facts, &guess).await?,
        Classification::Episode(guess) => place_episodes(conn, facts.library_id, &guess).await?,
        Classification::Unclassified => Placement::default(),
    };

    let path = facts.path.to_string_lossy();
    let container = container_of(facts.path);
    let video = facts.info.video.as_ref();
    let audio = facts.info.primary_audio();

    let write = media_files::MediaFileWrite {
        library_id: facts.library_id,
        movie_id: placement.movie_id.as_deref(),
        episode_id: placement.episode_ids.first().map(String::as_str),
        path: &path,
        size_bytes: facts.size_bytes as i64,
        hash: facts.hash,
        container: container.as_deref(),
        video_codec: video.map(|v| v.codec.as_str()),
        audio_codec: audio.map(|a| a.codec.as_str()),
        video_width: video.map(|v| i64::from(v.width)),
        video_height: video.map(|v| i64::from(v.height)),
        audio_channels: audio.map(|a| i64::from(a.channels)),
        duration_sec: i64::from(facts.info.duration_secs),
        seen_us: facts.seen_us,
    };

    let media_file_id = match existing_id {
        Some(id) => {
            if !media_files::update_media_file(&mut *conn, id, &write).await? {
                return Err(sqlx::Error::RowNotFound);
            }
            id.to_string()
        }
        None => media_files::insert_media_file(&mut *conn, &write).await?,
    };

    media_files::replace_episode_links(conn, &media_file_id, &placement.episode_ids).await?;
    tracks::replace_audio_tracks(conn, &media_file_id, &audio_tracks(facts.info)).await?;
    tracks::replace_subtitle_tracks(
        conn,
        &media_file_id,
        &subtitle_tracks(facts.info, facts.sidecars),
    )
    .await?;

    debug!(
        path = %path,
        media_file_id = %media_file_id,
        episodes = placement.episode_ids.len(),
        "media file synchronized"
    );

    Ok(SyncOutcome {
        media_file_id,
        movie_added: placement.movie_added,
        series_added: placement.series_added,
        episodes_added: placement.episodes_added,
    })
}

async fn place_movie(
    conn: &mut SqliteConnection,
    facts: &FileFacts<'_>,
    guess: &MovieGuess,
) -> Result<Placement, sqlx::Error> {
    let year = i64::from(guess.year);
    if let Some(movie) = movies::find_movie(&mut *conn, facts.library_id, &guess.title, year).await? {
        return Ok(Placement {
            movie_id: Some(movie.id),
            ..Placement::default()
        });
    }

    let runtime_min = i64::from(facts.info.duration_secs / 60);
    let movie =
        movies::create_movie(&mut *conn, facts.library_id, &guess.title, year, runtime_min).await?;
    debug!(title = %movie.title, year = movie.year, "movie created");

    Ok(Placement {
        movie_id: Some(movie.id),
        movie_added: true,
        ..Placement::default()
    })
}

async fn place_episodes(
    conn: &mut SqliteConnection,
    library_id: &str,
    guess: &EpisodeGuess,
) -> Result<Placement, sqlx::Error> {
    let mut placement = Placement::default();

    let series_row = match series::find_series(&mut *conn, library_id, &guess.series_title).await? {
        Some(s) => s,
        None => {
            placement.series_added = true;
            series::create_series(&mut *conn, library_id, &guess.series_title).await?
        }
    };

    let season_number = i64::from(guess.season);
    let season = match series::find_season(&mut *conn, &series_row.id, season_number).await? {
        Some(s) => s,
        None => series::create_season(&mut *conn, &series_row.id, season_number).await?,
    };

    for number in guess.episodes() {
        let number = i64::from(number);
        let episode = match series::find_episode(&mut *conn, &season.id, number).await? {
            Some(e) => e,
            None => {
                placement.episodes_added += 1;
                series::create_episode(&mut *conn, &season.id, number).await?
            }
        };
        placement.episode_ids.push(episode.id);
    }

    Ok(placement)
}

fn container_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
}

fn audio_tracks(info: &MediaInfo) -> Vec<tracks::NewAudioTrack> {
    info.audio
        .iter()
        .map(|a| tracks::NewAudioTrack {
            stream_index: i64::from(a.index),
            codec: a.codec.clone(),
            channels: i64::from(a.channels),
            language: a.language.clone(),
            title: a.title.clone(),
            is_default: a.is_default,
        })
        .collect()
}

fn subtitle_tracks(info: &MediaInfo, sidecars: &[SidecarSubtitle]) -> Vec<tracks::NewSubtitleTrack> {
    let embedded = info.subtitles.iter().map(|s| tracks::NewSubtitleTrack {
        source: SubtitleSource::Embedded,
        external_path: None,
        stream_index: Some(i64::from(s.index)),
        language: s.language.clone(),
        format: s.codec.clone(),
        title: s.title.clone(),
        is_forced: s.is_forced,
        is_default: s.is_default,
    });

    let external = sidecars.iter().map(|s| tracks::NewSubtitleTrack {
        source: SubtitleSource::External,
        external_path: Some(s.path.to_string_lossy().into_owned()),
        stream_index: None,
        language: s.language.clone(),
        format: s.format.as_str().to_string(),
        title: Some(s.title.clone()),
        is_forced: s.forced,
        is_default: false,
    });

    embedded.chain(external).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinedex_probe::{AudioStream, SubtitleStream};
    use std::path::PathBuf;

    use crate::subtitles::SubtitleFormat;

    #[test]
    fn container_is_lowercased_extension() {
        assert_eq!(container_of(Path::new("/m/Movie.MKV")).as_deref(), Some("mkv"));
        assert_eq!(container_of(Path::new("/m/Movie")), None);
    }

    #[test]
    fn subtitle_rows_cover_embedded_and_sidecars() {
        let info = MediaInfo {
            subtitles: vec![SubtitleStream {
                index: 3,
                codec: "subrip".into(),
                language: Some("eng".into()),
                title: None,
                is_forced: true,
                is_default: false,
            }],
            ..MediaInfo::default()
        };
        let sidecars = vec![SidecarSubtitle {
            path: PathBuf::from("/m/Movie.fr.srt"),
            format: SubtitleFormat::Srt,
            language: Some("fr".into()),
            forced: false,
            sdh: false,
            title: "FR".into(),
        }];

        let rows = subtitle_tracks(&info, &sidecars);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source, SubtitleSource::Embedded);
        assert_eq!(rows[0].stream_index, Some(3));
        assert!(rows[0].is_forced);
        assert_eq!(rows[1].source, SubtitleSource::External);
        assert_eq!(rows[1].external_path.as_deref(), Some("/m/Movie.fr.srt"));
        assert_eq!(rows[1].format, "srt");
        assert_eq!(rows[1].language.as_deref(), Some("fr"));
    }

    #[test]
    fn audio_rows_mirror_streams() {
        let info = MediaInfo {
            audio: vec![
                AudioStream {
                    index: 1,
                    codec: "aac".into(),
                    channels: 2,
                    language: Some("eng".into()),
                    title: None,
                    is_default: true,
                },
                AudioStream {
                    index: 2,
                    codec: "ac3".into(),
                    channels: 6,
                    language: None,
                    title: Some("Commentary".into()),
                    is_default: false,
                },
            ],
            ..MediaInfo::default()
        };
        let rows = audio_tracks(&info);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].stream_index, 2);
        assert_eq!(rows[1].channels, 6);
        assert_eq!(rows[1].title.as_deref(), Some("Commentary"));
    }
}
