use cinedex_core::types::ScanMode;
use cinedex_db::repo::libraries::LibraryRow;
use cinedex_scanner::ScanJob;

use crate::state::AppState;

/// Register a scan job and run the scan in the background.
///
/// Returns the job snapshot taken while it is still `running`.
pub async fn enqueue_library_scan(state: &AppState, library: LibraryRow, mode: ScanMode) -> ScanJob {
    let job = state.jobs.start(&library.id, mode).await;

    let job_id = job.id.clone();
    let scanner = state.scanner.clone();
    let jobs = state.jobs.clone();
    tokio::spawn(async move {
        match scanner.scan(&library, mode).await {
            Ok(result) => {
                tracing::info!(
                    job_id = %job_id,
                    library_id = %library.id,
                    files_scanned = result.files_scanned,
                    errors = result.errors.len(),
                    "scan job completed"
                );
                jobs.finish(&job_id, result).await;
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, library_id = %library.id, error = %e, "scan job failed");
                jobs.fail(&job_id, e.to_string()).await;
            }
        }
    });

    job
}
