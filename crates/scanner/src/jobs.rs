//! Process-wide registry of background scan jobs.
//!
//! A job starts `running` and moves exactly once to `done` or `failed`.
//! Jobs are never cancelled and stay in the registry for later lookups.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cinedex_core::types::{JobStatus, ScanMode};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::scan::ScanResult;

#[derive(Debug, Clone, Serialize)]
pub struct ScanJob {
    pub id: String,
    pub library_id: String,
    pub mode: ScanMode,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub summary: Option<ScanResult>,
}

/// Cheap to clone; every clone shares the same map.
#[derive(Debug, Clone, Default)]
pub struct ScanJobs {
    jobs: Arc<RwLock<HashMap<String, ScanJob>>>,
}

impl ScanJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new running job and return a snapshot of it.
    pub async fn start(&self, library_id: &str, mode: ScanMode) -> ScanJob {
        let job = ScanJob {
            id: uuid::Uuid::new_v4().to_string(),
            library_id: library_id.to_string(),
            mode,
            status: JobStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            error: None,
            summary: None,
        };
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        info!(job_id = %job.id, library_id, mode = %mode, "scan job started");
        job
    }

    /// Mark a running job done. Returns `false` if the job is unknown or
    /// already terminal.
    pub async fn finish(&self, job_id: &str, summary: ScanResult) -> bool {
        self.complete(job_id, JobStatus::Done, None, Some(summary))
            .await
    }

    /// Mark a running job failed. Returns `false` if the job is unknown or
    /// already terminal.
    pub async fn fail(&self, job_id: &str, error: impl Into<String>) -> bool {
        self.complete(job_id, JobStatus::Failed, Some(error.into()), None)
            .await
    }

    pub async fn get(&self, job_id: &str) -> Option<ScanJob> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> Vec<ScanJob> {
        let mut jobs: Vec<ScanJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    async fn complete(
        &self,
        job_id: &str,
        status: JobStatus,
        error: Option<String>,
        summary: Option<ScanResult>,
    ) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(job_id) else {
            warn!(job_id, "unknown scan job");
            return false;
        };
        if job.status.is_terminal() {
            warn!(job_id, status = %job.status, "scan job already finished");
            return false;
        }
        job.status = status;
        job.finished_at = Some(Utc::now());
        job.error = error;
        job.summary = summary;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn job_lifecycle_done() {
        let jobs = ScanJobs::new();
        let job = jobs.start("lib-1", ScanMode::Incremental).await;
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.finished_at.is_none());

        let summary = ScanResult {
            library_id: "lib-1".into(),
            files_scanned: 3,
            ..ScanResult::default()
        };
        assert!(jobs.finish(&job.id, summary).await);

        let stored = jobs.get(&job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Done);
        assert!(stored.finished_at.is_some());
        assert_eq!(stored.summary.unwrap().files_scanned, 3);
        assert!(stored.error.is_none());
    }

    #[tokio::test]
    async fn job_lifecycle_failed() {
        let jobs = ScanJobs::new();
        let job = jobs.start("lib-1", ScanMode::Rescan).await;
        assert!(jobs.fail(&job.id, "root missing").await);

        let stored = jobs.get(&job.id).await.unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(stored.error.as_deref(), Some("root missing"));
        assert!(stored.summary.is_none());
    }

    #[tokio::test]
    async fn terminal_jobs_do_not_transition_again() {
        let jobs = ScanJobs::new();
        let job = jobs.start("lib-1", ScanMode::Incremental).await;
        assert!(jobs.fail(&job.id, "boom").await);
        assert!(!jobs.finish(&job.id, ScanResult::default()).await);
        assert!(!jobs.fail(&job.id, "again").await);
        assert_eq!(jobs.get(&job.id).await.unwrap().error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn unknown_job() {
        let jobs = ScanJobs::new();
        assert!(jobs.get("nope").await.is_none());
        assert!(!jobs.finish("nope", ScanResult::default()).await);
    }

    #[tokio::test]
    async fn clones_share_state_and_list_everything() {
        let jobs = ScanJobs::new();
        let other = jobs.clone();
        let a = jobs.start("lib-1", ScanMode::Incremental).await;
        let b = other.start("lib-2", ScanMode::Rescan).await;

        let listed = jobs.list().await;
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|j| j.id == a.id));
        assert!(listed.iter().any(|j| j.id == b.id));
    }

    #[tokio::test]
    async fn job_serializes_with_snake_case_enums() {
        let jobs = ScanJobs::new();
        let job = jobs.start("lib-1", ScanMode::Rescan).await;
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["mode"], "rescan");
        assert!(json["finished_at"].is_null());
    }
}
