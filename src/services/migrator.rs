//! ArchiveMigrator — the per-asset migrate-and-rewrite state machine.
//!
//! Each candidate walks five steps in strict order: Fetch, Stage, Relocate,
//! Rewrite, Cleanup. Relocation must complete before the owner record is
//! rewritten, and the stale metadata is deleted only after the rewrite
//! persisted. Failing earlier leaves the container and its original asset
//! untouched; the batch as a whole never stops for one bad candidate.

use crate::models::candidate::Candidate;
use crate::services::{
    archive_store::{ArchiveStore, StorageError, StreamingCopier},
    record_store::{RecordError, RecordStore},
    transport::{ARCHIVE_SCHEME, ByteTransport, ORIGIN_SCHEME, TransportError},
};
use futures::{StreamExt, future, stream};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("origin locator `{uri}` unreadable: {source}")]
    OriginUnreadable {
        uri: String,
        #[source]
        source: TransportError,
    },
    #[error("staging copy of `{uri}` failed: {source}")]
    StagingFailed {
        uri: String,
        #[source]
        source: StorageError,
    },
    #[error("relocating into `{destination}` failed: {source}")]
    RelocationFailed {
        destination: String,
        #[source]
        source: StorageError,
    },
    #[error("rewriting container `{container_id}` failed: {source}")]
    OwnerRewriteFailed {
        container_id: i64,
        #[source]
        source: RecordError,
    },
}

impl MigrationError {
    /// Stable kind string for operator-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OriginUnreadable { .. } => "origin_unreadable",
            Self::StagingFailed { .. } => "staging_failed",
            Self::RelocationFailed { .. } => "relocation_failed",
            Self::OwnerRewriteFailed { .. } => "owner_rewrite_failed",
        }
    }
}

/// Terminal state of one successfully archived candidate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArchiveOutcome {
    /// Bytes relocated, owner rewritten, stale metadata deleted.
    Archived { link: String },
    /// Bytes relocated and owner rewritten, but deleting the stale
    /// asset/file failed. The container is correctly archived; the
    /// lingering metadata needs manual follow-up and is never reversed
    /// automatically.
    CleanupIncomplete { link: String, detail: String },
}

impl ArchiveOutcome {
    pub fn link(&self) -> &str {
        match self {
            Self::Archived { link } | Self::CleanupIncomplete { link, .. } => link,
        }
    }
}

/// Per-candidate result inside a batch.
#[derive(Debug)]
pub struct UnitReport {
    pub candidate: Candidate,
    pub outcome: Result<ArchiveOutcome, MigrationError>,
}

/// Result of one batch run. Per-unit ordering follows completion, which is
/// unspecified across candidates.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub units: Vec<UnitReport>,
    /// Candidates never started because the run was cancelled.
    pub skipped: usize,
}

impl BatchReport {
    pub fn archived(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, Ok(ArchiveOutcome::Archived { .. })))
            .count()
    }

    pub fn cleanup_incomplete(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, Ok(ArchiveOutcome::CleanupIncomplete { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.units.iter().filter(|u| u.outcome.is_err()).count()
    }
}

#[derive(Clone)]
pub struct ArchiveMigrator {
    store: RecordStore,
    transport: ByteTransport,
    copier: StreamingCopier,
    archive: ArchiveStore,
    archive_base_url: String,
    worker_count: usize,
}

impl ArchiveMigrator {
    /// `archive_base_url` is the externally resolvable prefix substituted for
    /// the archive scheme when rewriting owners; it must not end with `/`
    /// (config trims it at parse time).
    pub fn new(
        store: RecordStore,
        transport: ByteTransport,
        copier: StreamingCopier,
        archive: ArchiveStore,
        archive_base_url: impl Into<String>,
        worker_count: usize,
    ) -> Self {
        Self {
            store,
            transport,
            copier,
            archive,
            archive_base_url: archive_base_url.into(),
            worker_count: worker_count.max(1),
        }
    }

    /// Run the five-step state machine for one candidate.
    pub async fn migrate_one(
        &self,
        candidate: &Candidate,
    ) -> Result<ArchiveOutcome, MigrationError> {
        // 1. Fetch — nothing has been touched if the origin is unreadable.
        let mut reader = self.transport.open_read(&candidate.uri).await.map_err(|source| {
            MigrationError::OriginUnreadable {
                uri: candidate.uri.clone(),
                source,
            }
        })?;

        // 2. Stage — partial staging files are removed by the copier.
        let staged =
            self.copier
                .stage(&mut reader)
                .await
                .map_err(|source| MigrationError::StagingFailed {
                    uri: candidate.uri.clone(),
                    source,
                })?;

        // 3. Relocate — deterministic key, overwrite semantics, so a
        // crash-and-retry lands on the same destination. No record has been
        // mutated yet; a stranded staging file is acceptable.
        let destination = destination_key(candidate);
        let relocated: Result<String, StorageError> = async {
            self.archive
                .ensure_directory(&directory_locator(&destination))
                .await?;
            self.archive.move_into(&staged, &destination).await
        }
        .await;
        let final_locator = relocated.map_err(|source| MigrationError::RelocationFailed {
            destination: destination.clone(),
            source,
        })?;

        // 4. Rewrite — load, set the archive link, save. On failure the
        // original asset still exists, so a fresh resolver scan re-selects
        // this candidate and the re-copy overwrites the same key.
        let link = external_link(&self.archive_base_url, &final_locator);
        let rewritten: Result<(), RecordError> = async {
            let mut container = self.store.load_container(candidate.container_id).await?;
            container.archive_link = link.clone();
            self.store.save_container(&container).await
        }
        .await;
        rewritten.map_err(|source| MigrationError::OwnerRewriteFailed {
            container_id: candidate.container_id,
            source,
        })?;

        // 5. Cleanup — file record first, then the asset record, then the
        // now-redundant origin payload. Failures here degrade to a partial
        // success: the archive itself is correct.
        let cleanup: Result<(), String> = async {
            self.store
                .delete_file(candidate.file_id)
                .await
                .map_err(|err| format!("deleting file record: {err}"))?;
            self.store
                .delete_asset(candidate.asset_id)
                .await
                .map_err(|err| format!("deleting asset record: {err}"))?;
            self.transport
                .remove(&candidate.uri)
                .await
                .map_err(|err| format!("removing origin payload: {err}"))?;
            Ok(())
        }
        .await;

        match cleanup {
            Ok(()) => {
                debug!(
                    container = candidate.container_id,
                    asset = candidate.asset_id,
                    link,
                    "archived candidate"
                );
                Ok(ArchiveOutcome::Archived { link })
            }
            Err(detail) => {
                warn!(
                    container = candidate.container_id,
                    asset = candidate.asset_id,
                    detail,
                    "archived candidate but stale metadata lingers"
                );
                Ok(ArchiveOutcome::CleanupIncomplete { link, detail })
            }
        }
    }

    /// Process candidates across a bounded worker pool.
    ///
    /// One candidate's failure is captured in its unit report and never
    /// aborts siblings. After `cancel` fires no new candidate starts, but
    /// in-flight candidates run their remaining steps to completion (a
    /// mid-rewrite stop could leave relocated bytes with an empty link).
    pub async fn migrate_batch(
        &self,
        candidates: Vec<Candidate>,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let total = candidates.len();
        let units: Vec<UnitReport> = stream::iter(candidates)
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|candidate| async move {
                let outcome = self.migrate_one(&candidate).await;
                if let Err(err) = &outcome {
                    warn!(
                        container = candidate.container_id,
                        asset = candidate.asset_id,
                        kind = err.kind(),
                        error = %err,
                        "candidate failed"
                    );
                }
                UnitReport { candidate, outcome }
            })
            .buffer_unordered(self.worker_count)
            .collect()
            .await;

        let skipped = total - units.len();
        if skipped > 0 {
            info!(skipped, "batch cancelled before all candidates started");
        }

        BatchReport { units, skipped }
    }
}

/// Deterministic destination key for a candidate:
/// `archive://{container-prefix}/n_{container-id}-{filename}`.
///
/// The container prefix is the directory portion of the origin locator, so
/// two containers' same-named files can never collide (the id is baked into
/// the final segment). Locators outside the origin scheme (e.g. local paths
/// created by recovery) fall back to a bare `n_{id}-{filename}` key.
pub(crate) fn destination_key(candidate: &Candidate) -> String {
    let relative = candidate
        .uri
        .strip_prefix(ORIGIN_SCHEME)
        .unwrap_or(&candidate.filename);
    let (dir, file) = match relative.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", relative),
    };
    if dir.is_empty() {
        format!("{ARCHIVE_SCHEME}n_{}-{}", candidate.container_id, file)
    } else {
        format!("{ARCHIVE_SCHEME}{dir}/n_{}-{}", candidate.container_id, file)
    }
}

/// Directory portion of a destination key, kept as an `archive://` locator.
pub(crate) fn directory_locator(destination: &str) -> String {
    match destination.rsplit_once('/') {
        Some((dir, _)) if dir.len() > ARCHIVE_SCHEME.len() => dir.to_string(),
        _ => ARCHIVE_SCHEME.to_string(),
    }
}

/// Externally resolvable URL for an archive locator: the archive scheme is
/// substituted with the configured base URL.
pub(crate) fn external_link(base_url: &str, locator: &str) -> String {
    locator.replacen(ARCHIVE_SCHEME, &format!("{base_url}/"), 1)
}
