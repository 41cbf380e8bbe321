use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::classify;
use crate::error::ScanError;

/// Video file discovered during a filesystem walk.
#[derive(Debug, Clone)]
pub struct MediaEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Everything a walk found, plus the subdirectories and files it could not read.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub entries: Vec<MediaEntry>,
    pub errors: Vec<ScanError>,
}

// NAS and desktop junk directories
const JUNK_DIRS: &[&str] = &["@eaDir", "#recycle", ".Trash"];

/// Walk a library root recursively and collect video files in path order.
///
/// Only an unreadable root is an error; anything below it is recorded in
/// [`WalkOutcome::errors`] and skipped.
pub fn walk_media_dir(root: &Path) -> io::Result<WalkOutcome> {
    let read_dir = std::fs::read_dir(root)?;
    let mut outcome = WalkOutcome::default();
    visit(read_dir, &mut outcome);
    outcome.entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(outcome)
}

fn walk_recursive(dir: &Path, outcome: &mut WalkOutcome) {
    match std::fs::read_dir(dir) {
        Ok(rd) => visit(rd, outcome),
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "cannot read directory");
            outcome.errors.push(ScanError::io(dir, e));
        }
    }
}

fn visit(read_dir: std::fs::ReadDir, outcome: &mut WalkOutcome) {
    for entry in read_dir {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "cannot read directory entry");
                continue;
            }
        };
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') || classify::should_ignore(&name) {
            debug!(path = %path.display(), "skipping ignored entry");
            continue;
        }

        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read file type");
                outcome.errors.push(ScanError::io(path, e));
                continue;
            }
        };

        // Symlinked directories can loop back into the tree.
        if file_type.is_symlink() && path.is_dir() {
            debug!(path = %path.display(), "skipping symlinked directory");
            continue;
        }

        if file_type.is_dir() {
            if JUNK_DIRS.contains(&name.as_ref()) {
                debug!(path = %path.display(), "skipping junk directory");
                continue;
            }
            walk_recursive(&path, outcome);
        } else if classify::is_video_file(&name) {
            match std::fs::metadata(&path) {
                Ok(m) => outcome.entries.push(MediaEntry {
                    path,
                    size_bytes: m.len(),
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cannot stat file");
                    outcome.errors.push(ScanError::io(path, e));
                }
            }
        }
    }
}
