//! Scan Session: one pass over one library.
//!
//! ```text
//! Idle ──► Walking ──► Reconciling ──► Done
//!   └────────► Failed (root cannot be traversed)
//! ```
//!
//! Files are handled one at a time. Each file's catalog writes run inside a
//! single [`UnitOfWork`]; a failure rolls that file back, is recorded as a
//! [`ScanIssue`] and the walk moves on.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cinedex_core::types::{LibraryKind, ScanMode};
use cinedex_db::UnitOfWork;
use cinedex_db::repo::libraries::LibraryRow;
use cinedex_db::repo::media_files;
use cinedex_probe::MediaProber;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::change::{self, Change};
use crate::error::{ScanError, ScanIssue};
use crate::hasher::ContentHasher;
use crate::reconcile::{self, SweepReport};
use crate::subtitles;
use crate::sync::{self, FileFacts, SyncOutcome};
use crate::walk::{self, MediaEntry};

#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// How long a missing media file is kept before the sweep purges it.
    /// `None` keeps missing rows forever.
    pub missing_retention: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    Walking,
    Reconciling,
    Done,
    Failed,
}

impl ScanState {
    pub fn can_transition_to(self, next: ScanState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Walking)
                | (Self::Idle, Self::Failed)
                | (Self::Walking, Self::Reconciling)
                | (Self::Walking, Self::Done)
                | (Self::Reconciling, Self::Done)
        )
    }
}

/// Counts and non-fatal problems of a finished scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    pub library_id: String,
    pub files_scanned: usize,
    pub movies_added: usize,
    pub series_added: usize,
    pub episodes_added: usize,
    pub errors: Vec<ScanIssue>,
    /// `None` when the walk found no files and the sweep was skipped.
    pub sweep: Option<SweepReport>,
}

impl ScanResult {
    fn absorb(&mut self, outcome: &SyncOutcome) {
        if outcome.movie_added {
            self.movies_added += 1;
        }
        if outcome.series_added {
            self.series_added += 1;
        }
        self.episodes_added += outcome.episodes_added;
    }
}

struct Session<'a> {
    library_id: &'a str,
    state: ScanState,
}

impl Session<'_> {
    fn transition(&mut self, next: ScanState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal scan transition {:?} -> {next:?}",
            self.state
        );
        debug!(library_id = self.library_id, from = ?self.state, to = ?next, "scan state");
        self.state = next;
    }
}

/// Runs scan sessions against one catalog.
pub struct Scanner {
    pool: SqlitePool,
    prober: Arc<dyn MediaProber>,
    hasher: Arc<dyn ContentHasher>,
    config: ScanConfig,
}

impl Scanner {
    pub fn new(
        pool: SqlitePool,
        prober: Arc<dyn MediaProber>,
        hasher: Arc<dyn ContentHasher>,
        config: ScanConfig,
    ) -> Self {
        Self {
            pool,
            prober,
            hasher,
            config,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Scan a library. Only an untraversable root is an `Err`.
    pub async fn scan(&self, library: &LibraryRow, mode: ScanMode) -> Result<ScanResult, ScanError> {
        let mut session = Session {
            library_id: &library.id,
            state: ScanState::Idle,
        };
        let kind = library.kind().unwrap_or_else(|| {
            warn!(library_id = %library.id, kind = %library.kind, "unknown library kind, storing files unlinked");
            LibraryKind::Other
        });
        let root = Path::new(&library.path);
        let started_us = cinedex_db::now_us();

        let outcome = match walk::walk_media_dir(root) {
            Ok(o) => o,
            Err(source) => {
                session.transition(ScanState::Failed);
                warn!(library_id = %library.id, path = %library.path, error = %source, "library root unavailable");
                return Err(ScanError::RootUnavailable {
                    path: root.to_path_buf(),
                    source,
                });
            }
        };
        session.transition(ScanState::Walking);

        info!(
            library_id = %library.id,
            path = %library.path,
            mode = %mode,
            files_found = outcome.entries.len(),
            "scan found video files"
        );

        let mut result = ScanResult {
            library_id: library.id.clone(),
            ..ScanResult::default()
        };

        for err in &outcome.errors {
            let path = match err {
                ScanError::Io { path, .. } => path.to_string_lossy().into_owned(),
                _ => library.path.clone(),
            };
            result.errors.push(ScanIssue::for_file(&path, err));
        }

        for entry in &outcome.entries {
            result.files_scanned += 1;
            match self
                .process_file(&library.id, kind, mode, entry, started_us)
                .await
            {
                Ok(Some(synced)) => result.absorb(&synced),
                Ok(None) => {}
                Err(e) => {
                    let path = entry.path.to_string_lossy();
                    warn!(path = %path, error = %e, "failed to process media file");
                    result.errors.push(ScanIssue::for_file(&path, &e));
                }
            }
        }

        if result.files_scanned > 0 {
            session.transition(ScanState::Reconciling);
            let (report, issues) = reconcile::sweep(
                &self.pool,
                &library.id,
                started_us,
                self.config.missing_retention,
            )
            .await;
            result.sweep = Some(report);
            result.errors.extend(issues);
        }
        session.transition(ScanState::Done);

        info!(
            library_id = %library.id,
            files_scanned = result.files_scanned,
            movies_added = result.movies_added,
            series_added = result.series_added,
            episodes_added = result.episodes_added,
            errors = result.errors.len(),
            "scan complete"
        );

        Ok(result)
    }

    /// Handle one walked file. Returns `None` when nothing beyond the seen
    /// marker was written.
    async fn process_file(
        &self,
        library_id: &str,
        kind: LibraryKind,
        mode: ScanMode,
        entry: &MediaEntry,
        started_us: i64,
    ) -> Result<Option<SyncOutcome>, ScanError> {
        let path_str = entry.path.to_string_lossy();
        let existing =
            media_files::get_media_file_by_path(&self.pool, library_id, &path_str).await?;

        let change = change::detect(&entry.path, existing.as_ref(), mode, &*self.hasher)
            .await
            .map_err(|e| ScanError::io(&entry.path, e))?;

        let (existing_id, hash) = match change {
            Change::Seen { file_id } | Change::Unchanged { file_id } => {
                let mut uow = UnitOfWork::begin(&self.pool).await?;
                media_files::mark_media_file_seen(uow.conn(), &file_id, started_us).await?;
                uow.commit().await?;
                debug!(path = %path_str, "media file unchanged");
                return Ok(None);
            }
            Change::New { hash } => (None, hash),
            Change::Changed { file_id, hash } => (Some(file_id), hash),
        };

        // Probing happens before the transaction opens so no write lock is
        // held while the external tool runs.
        let info = self.prober.probe(&entry.path).await?;
        let sidecars = subtitles::discover_sidecars(&entry.path);

        let facts = FileFacts {
            library_id,
            kind,
            path: &entry.path,
            size_bytes: entry.size_bytes,
            hash: &hash,
            info: &info,
            sidecars: &sidecars,
            seen_us: started_us,
        };

        let mut uow = UnitOfWork::begin(&self.pool).await?;
        let outcome = sync::sync_file(uow.conn(), existing_id.as_deref(), &facts).await?;
        uow.commit().await?;

        Ok(Some(outcome))
    }
}
