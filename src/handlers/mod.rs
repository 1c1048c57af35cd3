pub mod archive_handlers;
pub mod health_handlers;

use crate::services::{pipeline::ArchivePipeline, recovery::RecoveryReconstructor};
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};

/// Shared state carried by the admin router.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub pipeline: ArchivePipeline,
    pub recovery: RecoveryReconstructor,
    /// Used by the readiness probe's disk check.
    pub staging_dir: PathBuf,
}
