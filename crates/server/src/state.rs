use std::sync::Arc;

use cinedex_scanner::{ScanJobs, Scanner};
use sqlx::SqlitePool;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub scanner: Arc<Scanner>,
    pub jobs: ScanJobs,
}
