//! Change Detector: decides how much work a walked file needs.
//!
//! Incremental scans cost one catalog lookup per known file. Hashing is
//! reserved for new files, resurrected files and Rescan passes.

use std::io;
use std::path::Path;

use cinedex_core::types::ScanMode;
use cinedex_db::repo::media_files::MediaFileRow;

use crate::hasher::ContentHasher;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Incremental mode trusts the stored record.
    Seen { file_id: String },
    /// Rescan hashed the file and got the stored digest back.
    Unchanged { file_id: String },
    /// First sighting of this path.
    New { hash: String },
    /// Known path whose content differs, or a missing record that reappeared.
    Changed { file_id: String, hash: String },
}

pub async fn detect(
    path: &Path,
    existing: Option<&MediaFileRow>,
    mode: ScanMode,
    hasher: &dyn ContentHasher,
) -> io::Result<Change> {
    let Some(existing) = existing else {
        return Ok(Change::New {
            hash: hasher.hash(path).await?,
        });
    };

    // A sweep already unlinked a missing record, so it always goes through
    // the full pipeline again.
    if existing.is_missing {
        return Ok(Change::Changed {
            file_id: existing.id.clone(),
            hash: hasher.hash(path).await?,
        });
    }

    match mode {
        ScanMode::Incremental => Ok(Change::Seen {
            file_id: existing.id.clone(),
        }),
        ScanMode::Rescan => {
            let hash = hasher.hash(path).await?;
            if hash == existing.hash {
                Ok(Change::Unchanged {
                    file_id: existing.id.clone(),
                })
            } else {
                Ok(Change::Changed {
                    file_id: existing.id.clone(),
                    hash,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedHasher {
        digest: &'static str,
        calls: AtomicUsize,
    }

    impl FixedHasher {
        fn new(digest: &'static str) -> Self {
            Self {
                digest,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl ContentHasher for FixedHasher {
        async fn hash(&self, _path: &Path) -> io::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.digest.to_string())
        }
    }

    fn record(hash: &str, is_missing: bool) -> MediaFileRow {
        MediaFileRow {
            id: "file-1".into(),
            library_id: "lib-1".into(),
            movie_id: None,
            episode_id: None,
            path: "/m/a.mkv".into(),
            size_bytes: 10,
            hash: hash.into(),
            container: Some("mkv".into()),
            video_codec: None,
            audio_codec: None,
            video_width: None,
            video_height: None,
            audio_channels: None,
            duration_sec: 0,
            last_seen_us: Some(1),
            is_missing,
            missing_since_us: is_missing.then_some(2),
            created_ts: 0,
            updated_ts: 0,
        }
    }

    const PATH: &str = "/m/a.mkv";

    #[tokio::test]
    async fn new_file_is_hashed_and_processed() {
        let hasher = FixedHasher::new("aa");
        let change = detect(Path::new(PATH), None, ScanMode::Incremental, &hasher)
            .await
            .unwrap();
        assert_eq!(change, Change::New { hash: "aa".into() });
        assert_eq!(hasher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn incremental_trusts_known_file_without_hashing() {
        let hasher = FixedHasher::new("zz");
        let existing = record("aa", false);
        let change = detect(Path::new(PATH), Some(&existing), ScanMode::Incremental, &hasher)
            .await
            .unwrap();
        assert_eq!(
            change,
            Change::Seen {
                file_id: "file-1".into()
            }
        );
        assert_eq!(hasher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rescan_short_circuits_on_same_hash() {
        let hasher = FixedHasher::new("aa");
        let existing = record("aa", false);
        let change = detect(Path::new(PATH), Some(&existing), ScanMode::Rescan, &hasher)
            .await
            .unwrap();
        assert_eq!(
            change,
            Change::Unchanged {
                file_id: "file-1".into()
            }
        );
        assert_eq!(hasher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rescan_detects_content_change() {
        let hasher = FixedHasher::new("bb");
        let existing = record("aa", false);
        let change = detect(Path::new(PATH), Some(&existing), ScanMode::Rescan, &hasher)
            .await
            .unwrap();
        assert_eq!(
            change,
            Change::Changed {
                file_id: "file-1".into(),
                hash: "bb".into()
            }
        );
    }

    #[tokio::test]
    async fn missing_record_is_reprocessed_in_either_mode() {
        for mode in [ScanMode::Incremental, ScanMode::Rescan] {
            let hasher = FixedHasher::new("aa");
            let existing = record("aa", true);
            let change = detect(Path::new(PATH), Some(&existing), mode, &hasher)
                .await
                .unwrap();
            assert_eq!(
                change,
                Change::Changed {
                    file_id: "file-1".into(),
                    hash: "aa".into()
                },
                "mode {mode}"
            );
        }
    }

    #[tokio::test]
    async fn hash_failure_propagates() {
        struct Broken;

        #[async_trait::async_trait]
        impl ContentHasher for Broken {
            async fn hash(&self, _path: &Path) -> io::Result<String> {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            }
        }

        let existing = record("aa", false);
        let err = detect(Path::new(PATH), Some(&existing), ScanMode::Rescan, &Broken)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
