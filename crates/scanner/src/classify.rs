//! Filename classifier.
//!
//! Pure functions that map a file path to a movie guess or an episode guess.
//! Nothing here does I/O and nothing here fails: an ambiguous name still
//! yields a best-effort guess.
//!
//! Episode patterns are tried in a fixed priority order and the first match
//! wins. Overlaps are known (`1920x1080` reads as `20x108`, a year can read
//! as an anime episode number) and left alone.

use regex::Regex;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::LazyLock;

use cinedex_core::types::LibraryKind;

/// Movie identity derived from a filename. `year` is 0 when none was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieGuess {
    pub title: String,
    pub year: i32,
}

/// Episode position derived from a filename, plus the series title derived
/// from the directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeGuess {
    pub series_title: String,
    pub season: u32,
    pub episode_start: u32,
    /// Always `>= episode_start`.
    pub episode_end: u32,
}

impl EpisodeGuess {
    /// Every episode number the file covers, ascending.
    pub fn episodes(&self) -> RangeInclusive<u32> {
        self.episode_start..=self.episode_end
    }
}

/// Result of classifying a media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Movie(MovieGuess),
    Episode(EpisodeGuess),
    /// Libraries of kind `other` keep files without linking them.
    Unclassified,
}

// Patterns to ignore
static IGNORE_NAMES: &[&str] = &[
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    ".nfo",
    ".txt",
    ".jpg",
    ".jpeg",
    ".png",
    ".part",
];

static VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "mov", "wmv", "flv", "webm", "ts", "m2ts", "mpg", "mpeg", "3gp",
    "ogv",
];

// S02E05-07, s2e5_7, S02E05-E07
static RE_SXXEXX_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s(\d{1,2})e(\d{1,3})[-_]e?(\d{1,3})").unwrap());

// S01E02, s1e3
static RE_SXXEXX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s(\d{1,2})e(\d{1,3})").unwrap());

// 1x02
static RE_NXN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d{1,2})x(\d{1,3})").unwrap());

// "[Group] Show - 05.mkv", "Show_12.mkv"
static RE_TRAILING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(.*?)[\s._-]+(\d{1,4})(?:\D|$)").unwrap());

// First free-standing number anywhere in the name.
static RE_FREE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,4})\b").unwrap());

// "Title (2021)", "Title.2021.1080p"
static RE_MOVIE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)[\s.\-_]*\(?((?:19|20)\d{2})\)?").unwrap()
});

// "S01", "s2"
static RE_SEASON_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^s\d{1,2}$").unwrap());

// "1", "02"
static RE_BARE_SEASON_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{1,2}$").unwrap());

/// Check if a filename should be ignored.
pub fn should_ignore(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    IGNORE_NAMES
        .iter()
        .any(|pat| lower == pat.to_lowercase() || lower.ends_with(pat))
}

/// Check if a file has a video extension.
pub fn is_video_file(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()),
        None => false,
    }
}

/// Replace `.` and `_` separators with spaces and trim.
pub fn normalize_title(raw: &str) -> String {
    raw.replace(['.', '_'], " ").trim().to_string()
}

/// Classify a file according to the branch its library kind selects.
pub fn classify(kind: LibraryKind, path: &Path) -> Classification {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();

    match kind {
        LibraryKind::Movies => Classification::Movie(guess_movie(&file_name)),
        kind if kind.is_episodic() => {
            let (season, episode_start, episode_end) = guess_episode_numbers(&file_name);
            Classification::Episode(EpisodeGuess {
                series_title: series_title_from_path(path),
                season,
                episode_start,
                episode_end,
            })
        }
        _ => Classification::Unclassified,
    }
}

/// Parse a movie title and year out of a filename such as
/// `Movie Title (2021).mkv` or `Movie.Title.2021.1080p.mkv`.
pub fn guess_movie(file_name: &str) -> MovieGuess {
    let stem = strip_extension(file_name);

    if let Some(caps) = RE_MOVIE_YEAR.captures(stem) {
        if let Ok(year) = caps[2].parse::<i32>() {
            return MovieGuess {
                title: normalize_title(&caps[1]),
                year,
            };
        }
    }

    MovieGuess {
        title: normalize_title(stem),
        year: 0,
    }
}

/// Return `(season, first episode, last episode)` for an episode filename.
pub fn guess_episode_numbers(file_name: &str) -> (u32, u32, u32) {
    if let Some(caps) = RE_SXXEXX_RANGE.captures(file_name) {
        let season = parse_num(&caps[1]);
        let start = parse_num(&caps[2]);
        let end = parse_num(&caps[3]).max(start);
        return (season, start, end);
    }

    if let Some(caps) = RE_SXXEXX.captures(file_name) {
        let episode = parse_num(&caps[2]);
        return (parse_num(&caps[1]), episode, episode);
    }

    if let Some(caps) = RE_NXN.captures(file_name) {
        let episode = parse_num(&caps[2]);
        return (parse_num(&caps[1]), episode, episode);
    }

    if let Some(caps) = RE_TRAILING_NUMBER.captures(file_name) {
        let episode = parse_num(&caps[2]);
        return (1, episode, episode);
    }

    let episode = RE_FREE_NUMBER
        .captures(file_name)
        .map(|caps| parse_num(&caps[1]))
        .unwrap_or(1);
    (1, episode, episode)
}

/// Derive the series title from the directory layout.
///
/// Uses the parent directory, or the grandparent when the parent is a season
/// folder (`Show/Season 02/file.mkv` yields `Show`).
pub fn series_title_from_path(path: &Path) -> String {
    let mut dirs = path
        .parent()
        .into_iter()
        .flat_map(|p| p.ancestors())
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy());

    let Some(parent) = dirs.next() else {
        return String::new();
    };

    if is_season_folder(&parent) {
        return dirs.next().map(|gp| normalize_title(&gp)).unwrap_or_default();
    }
    normalize_title(&parent)
}

/// Matches `Season 2`, `season02`, `S01`, `s2`, `1` and `02`, but not `Specials`.
pub fn is_season_folder(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    lower.starts_with("season")
        || RE_SEASON_TOKEN.is_match(&lower)
        || RE_BARE_SEASON_NUMBER.is_match(&lower)
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[..pos],
        _ => file_name,
    }
}

fn parse_num(digits: &str) -> u32 {
    digits.parse().unwrap_or(0)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(path: &str) -> EpisodeGuess {
        match classify(LibraryKind::Series, Path::new(path)) {
            Classification::Episode(ep) => ep,
            other => panic!("expected episode, got {other:?}"),
        }
    }

    #[test]
    fn season_folder_is_skipped_for_series_title() {
        let ep = episode("/Library/ShowName/Season 02/ShowName.S02E01.mkv");
        assert_eq!(
            ep,
            EpisodeGuess {
                series_title: "ShowName".into(),
                season: 2,
                episode_start: 1,
                episode_end: 1,
            }
        );
    }

    #[test]
    fn range_produces_every_episode() {
        let ep = episode("/tv/Show/S02E05-07.mkv");
        assert_eq!(ep.season, 2);
        assert_eq!(ep.episodes().collect::<Vec<_>>(), vec![5, 6, 7]);
    }

    #[test]
    fn range_with_repeated_e_marker() {
        assert_eq!(guess_episode_numbers("Show.S01E01-E02.mkv"), (1, 1, 2));
    }

    #[test]
    fn inverted_range_is_clamped() {
        assert_eq!(guess_episode_numbers("Show.S01E09-03.mkv"), (1, 9, 9));
    }

    #[test]
    fn single_sxxexx() {
        assert_eq!(
            guess_episode_numbers("Breaking.Bad.s02e05.Episode.Title.mkv"),
            (2, 5, 5)
        );
    }

    #[test]
    fn nxm_format() {
        assert_eq!(guess_episode_numbers("Seinfeld.3x12.avi"), (3, 12, 12));
    }

    #[test]
    fn anime_trailing_number() {
        assert_eq!(
            guess_episode_numbers("[SubGroup] Frieren - 12 (1080p).mkv"),
            (1, 12, 12)
        );
        assert_eq!(guess_episode_numbers("Show_07.mkv"), (1, 7, 7));
    }

    #[test]
    fn fallback_free_number_then_default() {
        assert_eq!(guess_episode_numbers("05.mkv"), (1, 5, 5));
        assert_eq!(guess_episode_numbers("Pilot.mkv"), (1, 1, 1));
    }

    #[test]
    fn resolution_token_matches_nxm_first() {
        // Fixed priority: NxM is tried before the anime pattern.
        assert_eq!(guess_episode_numbers("Show - 03 [1920x1080].mkv"), (20, 108, 108));
    }

    #[test]
    fn movie_with_year_paren() {
        assert_eq!(
            guess_movie("The Matrix (1999).mkv"),
            MovieGuess {
                title: "The Matrix".into(),
                year: 1999,
            }
        );
    }

    #[test]
    fn movie_with_year_dot() {
        assert_eq!(
            guess_movie("Inception.2010.1080p.BluRay.mkv"),
            MovieGuess {
                title: "Inception".into(),
                year: 2010,
            }
        );
    }

    #[test]
    fn movie_without_year() {
        assert_eq!(
            guess_movie("Some_Random.Movie.mp4"),
            MovieGuess {
                title: "Some Random Movie".into(),
                year: 0,
            }
        );
    }

    #[test]
    fn movie_library_never_yields_episodes() {
        let c = classify(LibraryKind::Movies, Path::new("/m/Show.S01E01.mkv"));
        assert!(matches!(c, Classification::Movie(_)));
    }

    #[test]
    fn other_library_is_unclassified() {
        let c = classify(LibraryKind::Other, Path::new("/misc/clip.mp4"));
        assert_eq!(c, Classification::Unclassified);
    }

    #[test]
    fn season_folder_shapes() {
        for name in ["Season 1", "season02", "SEASON_3", "S01", "s2", "1", "02"] {
            assert!(is_season_folder(name), "{name} should be a season folder");
        }
        for name in ["Specials", "Show Name", "Sky", "123", "Extras"] {
            assert!(!is_season_folder(name), "{name} should not be a season folder");
        }
    }

    #[test]
    fn series_title_normalizes_separators() {
        assert_eq!(
            series_title_from_path(Path::new("/tv/The_Expanse/S03/The.Expanse.S03E01.mkv")),
            "The Expanse"
        );
        assert_eq!(
            series_title_from_path(Path::new("/anime/Cowboy.Bebop/05.mkv")),
            "Cowboy Bebop"
        );
    }

    #[test]
    fn ignore_patterns() {
        assert!(should_ignore(".DS_Store"));
        assert!(should_ignore("Thumbs.db"));
        assert!(should_ignore("movie.nfo"));
        assert!(should_ignore("poster.jpg"));
        assert!(!should_ignore("movie.mkv"));
    }

    #[test]
    fn video_extension_check() {
        assert!(is_video_file("movie.mkv"));
        assert!(is_video_file("Movie.MP4"));
        assert!(is_video_file("ep.avi"));
        assert!(!is_video_file("poster.jpg"));
        assert!(!is_video_file("subs.srt"));
        assert!(!is_video_file("mkv"));
    }
}
