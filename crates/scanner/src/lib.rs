#![allow(clippy::collapsible_if, clippy::manual_range_contains)]
pub mod change;
pub mod classify;
pub mod error;
pub mod hasher;
pub mod jobs;
pub mod reconcile;
pub mod scan;
pub mod subtitles;
pub mod sync;
pub mod walk;

pub use error::{IssueKind, ScanError, ScanIssue};
pub use hasher::{ContentHasher, Sha256Hasher};
pub use jobs::{ScanJob, ScanJobs};
pub use scan::{ScanConfig, ScanResult, Scanner};
