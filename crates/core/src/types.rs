use serde::{Deserialize, Serialize};

/// Library content type, stored in the `library.kind` column.
///
/// Selects which classification and synchronization branch a scan uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryKind {
    Movies,
    Series,
    Anime,
    Other,
}

impl LibraryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movies => "movies",
            Self::Series => "series",
            Self::Anime => "anime",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movies" => Some(Self::Movies),
            "series" => Some(Self::Series),
            "anime" => Some(Self::Anime),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Series and anime libraries share the episode branch.
    pub fn is_episodic(self) -> bool {
        matches!(self, Self::Series | Self::Anime)
    }
}

impl std::fmt::Display for LibraryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a scan treats files the catalog already knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Trust prior results for known paths: no hashing, no probing.
    Incremental,
    /// Re-hash every known file to detect silent content changes.
    Rescan,
}

impl ScanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::Rescan => "rescan",
        }
    }
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scan job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a subtitle track comes from, stored in `subtitle_track.source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleSource {
    Embedded,
    External,
}

impl SubtitleSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::External => "external",
        }
    }
}

impl std::fmt::Display for SubtitleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_kind_round_trips_through_column_text() {
        for kind in [
            LibraryKind::Movies,
            LibraryKind::Series,
            LibraryKind::Anime,
            LibraryKind::Other,
        ] {
            assert_eq!(LibraryKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(LibraryKind::parse("tv_shows"), None);
    }

    #[test]
    fn only_series_and_anime_are_episodic() {
        assert!(LibraryKind::Series.is_episodic());
        assert!(LibraryKind::Anime.is_episodic());
        assert!(!LibraryKind::Movies.is_episodic());
        assert!(!LibraryKind::Other.is_episodic());
    }

    #[test]
    fn running_is_the_only_live_status() {
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
