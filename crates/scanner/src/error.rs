use std::path::PathBuf;

use cinedex_probe::ProbeError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("library root {path} cannot be traversed: {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl ScanError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> IssueKind {
        match self {
            Self::RootUnavailable { .. } | Self::Io { .. } => IssueKind::Io,
            Self::Probe(_) => IssueKind::Probe,
            Self::Db(_) => IssueKind::Persistence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Io,
    Probe,
    Persistence,
    Sweep,
}

/// A non-fatal problem recorded during a scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanIssue {
    /// The file concerned. `None` for sweep steps.
    pub path: Option<String>,
    pub kind: IssueKind,
    pub message: String,
}

impl ScanIssue {
    pub fn for_file(path: &str, err: &ScanError) -> Self {
        Self {
            path: Some(path.to_string()),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn sweep(step: &str, err: &sqlx::Error) -> Self {
        Self {
            path: None,
            kind: IssueKind::Sweep,
            message: format!("{step}: {err}"),
        }
    }
}
