//! Sidecar subtitle file discovery.
//!
//! A sidecar shares the video's stem, optionally followed by a suffix:
//! - `Movie.srt`           → no language
//! - `Movie.en.srt`        → language "en"
//! - `Movie_es.srt`        → language "es"
//! - `Movie.en.forced.srt` → language "en", forced
//! - `Movie.en.sdh.srt`    → language "en", hearing impaired
//!
//! Supported extensions: .srt, .sub, .ass, .ssa, .vtt, .sup, .idx

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A discovered sidecar subtitle file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidecarSubtitle {
    pub path: PathBuf,
    pub format: SubtitleFormat,
    pub language: Option<String>,
    pub forced: bool,
    pub sdh: bool, // hearing impaired / SDH
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtitleFormat {
    Srt,
    Sub,
    Ass,
    Ssa,
    Vtt,
    Sup, // PGS bitmap
    Idx, // VobSub index
}

impl SubtitleFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "srt" => Some(Self::Srt),
            "sub" => Some(Self::Sub),
            "ass" => Some(Self::Ass),
            "ssa" => Some(Self::Ssa),
            "vtt" => Some(Self::Vtt),
            "sup" => Some(Self::Sup),
            "idx" => Some(Self::Idx),
            _ => None,
        }
    }

    /// Lower-case extension, stored as the track format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Sub => "sub",
            Self::Ass => "ass",
            Self::Ssa => "ssa",
            Self::Vtt => "vtt",
            Self::Sup => "sup",
            Self::Idx => "idx",
        }
    }
}

const SUFFIX_SEPARATORS: [char; 3] = ['.', '_', '-'];

/// Split the part of `sub_stem` that follows `media_stem` into language and flags.
///
/// Returns `None` when `sub_stem` is not a sidecar of `media_stem` at all, e.g.
/// `Movie 2` against `Movie`.
fn parse_suffix(media_stem: &str, sub_stem: &str) -> Option<(Option<String>, bool, bool)> {
    let rest = sub_stem.strip_prefix(media_stem)?;
    if !rest.is_empty() && !rest.starts_with(SUFFIX_SEPARATORS) {
        return None;
    }

    let mut language = None;
    let mut forced = false;
    let mut sdh = false;

    for part in rest.split(SUFFIX_SEPARATORS).filter(|s| !s.is_empty()) {
        let lower = part.trim().to_ascii_lowercase();
        match lower.as_str() {
            "forced" => forced = true,
            "sdh" | "hi" | "cc" => sdh = true,
            "" => {}
            _ if language.is_none() => language = Some(lower),
            _ => {}
        }
    }

    Some((language, forced, sdh))
}

/// Discover sidecar subtitle files next to a media file, sorted by path.
///
/// An unreadable directory yields no sidecars.
pub fn discover_sidecars(media_path: &Path) -> Vec<SidecarSubtitle> {
    let Some(parent) = media_path.parent() else {
        return Vec::new();
    };
    let Some(media_stem) = media_path.file_stem().and_then(|s| s.to_str()) else {
        return Vec::new();
    };

    let entries = match std::fs::read_dir(parent) {
        Ok(e) => e,
        Err(e) => {
            debug!(path = %parent.display(), error = %e, "cannot list sidecar directory");
            return Vec::new();
        }
    };

    let mut results = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(format) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SubtitleFormat::from_extension)
        else {
            continue;
        };

        let Some(sub_stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let Some((language, forced, sdh)) = parse_suffix(media_stem, sub_stem) else {
            continue;
        };

        let title = build_title(language.as_deref(), forced, sdh);
        results.push(SidecarSubtitle {
            path,
            format,
            language,
            forced,
            sdh,
            title,
        });
    }

    results.sort_by(|a, b| a.path.cmp(&b.path));
    results
}

fn build_title(language: Option<&str>, forced: bool, sdh: bool) -> String {
    let mut parts = vec![language.map_or_else(|| "Unknown".to_string(), str::to_uppercase)];
    if forced {
        parts.push("Forced".into());
    }
    if sdh {
        parts.push("SDH".into());
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn subtitle_format_detection() {
        assert_eq!(SubtitleFormat::from_extension("srt"), Some(SubtitleFormat::Srt));
        assert_eq!(SubtitleFormat::from_extension("SRT"), Some(SubtitleFormat::Srt));
        assert_eq!(SubtitleFormat::from_extension("ass"), Some(SubtitleFormat::Ass));
        assert_eq!(SubtitleFormat::from_extension("vtt"), Some(SubtitleFormat::Vtt));
        assert_eq!(SubtitleFormat::from_extension("mp4"), None);
        assert_eq!(SubtitleFormat::Sup.as_str(), "sup");
    }

    #[test]
    fn suffix_language_and_flags() {
        assert_eq!(
            parse_suffix("Movie.2020", "Movie.2020.en"),
            Some((Some("en".into()), false, false))
        );
        assert_eq!(
            parse_suffix("Movie.2020", "Movie.2020.en.forced"),
            Some((Some("en".into()), true, false))
        );
        assert_eq!(
            parse_suffix("Movie.2020", "Movie.2020.EN.sdh"),
            Some((Some("en".into()), false, true))
        );
        assert_eq!(
            parse_suffix("Movie", "Movie_es"),
            Some((Some("es".into()), false, false))
        );
    }

    #[test]
    fn suffix_without_language() {
        assert_eq!(parse_suffix("Movie.2020", "Movie.2020"), Some((None, false, false)));
        assert_eq!(parse_suffix("Movie", "Movie.forced"), Some((None, true, false)));
    }

    #[test]
    fn stem_must_end_at_a_separator() {
        assert_eq!(parse_suffix("Movie", "Movie 2.en"), None);
        assert_eq!(parse_suffix("Movie", "Other.en"), None);
    }

    #[test]
    fn discover_sidecars_finds_subtitles() {
        let tmp = tempfile::tempdir().unwrap();

        let media = tmp.path().join("Movie.Title.2020.mkv");
        fs::write(&media, "fake video").unwrap();

        fs::write(tmp.path().join("Movie.Title.2020.en.srt"), "Hello").unwrap();
        fs::write(tmp.path().join("Movie.Title.2020.fr.forced.srt"), "Bonjour").unwrap();
        fs::write(tmp.path().join("Movie.Title.2020.srt"), "no lang").unwrap();
        fs::write(tmp.path().join("Movie.Title.2020.en.sdh.ass"), "sdh subs").unwrap();
        // Unrelated files
        fs::write(tmp.path().join("OtherMovie.en.srt"), "not ours").unwrap();
        fs::write(tmp.path().join("Movie.Title.2020.nfo"), "not a subtitle").unwrap();

        let subs = discover_sidecars(&media);
        assert_eq!(subs.len(), 4);

        let en_srt = subs
            .iter()
            .find(|s| s.language.as_deref() == Some("en") && s.format == SubtitleFormat::Srt)
            .unwrap();
        assert!(!en_srt.forced);
        assert_eq!(en_srt.title, "EN");

        let fr_forced = subs
            .iter()
            .find(|s| s.language.as_deref() == Some("fr"))
            .unwrap();
        assert!(fr_forced.forced);
        assert_eq!(fr_forced.title, "FR Forced");

        let no_lang = subs.iter().find(|s| s.language.is_none()).unwrap();
        assert_eq!(no_lang.title, "Unknown");

        let sdh_ass = subs
            .iter()
            .find(|s| s.sdh && s.format == SubtitleFormat::Ass)
            .unwrap();
        assert_eq!(sdh_ass.language.as_deref(), Some("en"));
    }

    #[test]
    fn missing_directory_yields_nothing() {
        assert!(discover_sidecars(Path::new("/nonexistent/cinedex/Movie.mkv")).is_empty());
    }
}
