#![allow(clippy::collapsible_if)]
pub mod ffprobe;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use ffprobe::{AudioStream, MediaInfo, SubtitleStream, VideoStream};

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("ffprobe not found at {0}")]
    BinaryNotFound(PathBuf),
    #[error("ffprobe could not be started: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("ffprobe exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("ffprobe output is malformed: {0}")]
    Malformed(String),
}

/// Extracts stream and container metadata from a media file.
///
/// Failures are per file. Callers record them and move on.
#[async_trait::async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError>;
}

/// [`MediaProber`] backed by the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct Ffprobe {
    pub binary: PathBuf,
}

impl Ffprobe {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait::async_trait]
impl MediaProber for Ffprobe {
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ProbeError> {
        ffprobe::probe(&self.binary, path).await
    }
}
