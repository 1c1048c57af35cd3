//! RecoveryReconstructor — rebuilds a working local copy from an archived
//! asset.
//!
//! Inverse of the migrator: given a container whose archive link is
//! populated, it re-derives the original filename from the link, fetches the
//! archived bytes, stores them at a fixed local staging name, and creates a
//! fresh file record plus an "original"-role asset pointing at it.

use crate::models::asset::ROLE_ORIGINAL;
use crate::services::{
    record_store::{RecordError, RecordStore},
    transport::{ARCHIVE_SCHEME, ByteTransport, TransportError},
};
use std::{io, path::PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

/// Fixed name of the recovered local copy. Re-running recovery overwrites it.
const RECOVERED_FILE_NAME: &str = "temp_recovered_file";

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("container `{0}` has no archive link")]
    NotArchived(i64),
    #[error("fetching archived bytes from `{url}` failed: {source}")]
    ArchiveUnreachable {
        url: String,
        #[source]
        source: TransportError,
    },
    #[error("storing recovered copy failed: {0}")]
    CopyWriteFailed(#[from] io::Error),
    #[error("creating replacement records failed: {0}")]
    AssetCreateFailed(#[source] RecordError),
    #[error(transparent)]
    Query(RecordError),
}

pub type RecoveryResult<T> = Result<T, RecoveryError>;

#[derive(Clone)]
pub struct RecoveryReconstructor {
    store: RecordStore,
    transport: ByteTransport,
    staging_dir: PathBuf,
    archive_base_url: String,
}

impl RecoveryReconstructor {
    pub fn new(
        store: RecordStore,
        transport: ByteTransport,
        staging_dir: impl Into<PathBuf>,
        archive_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            transport,
            staging_dir: staging_dir.into(),
            archive_base_url: archive_base_url.into(),
        }
    }

    /// Reconstruct a local copy and metadata record for an archived
    /// container, returning the id of the new asset.
    ///
    /// The file record is created before the asset record, so a persistence
    /// failure never leaves an asset referencing a non-existent file.
    pub async fn recover(&self, container_id: i64) -> RecoveryResult<i64> {
        let container = self
            .store
            .load_container(container_id)
            .await
            .map_err(RecoveryError::Query)?;
        if !container.is_archived() {
            return Err(RecoveryError::NotArchived(container_id));
        }

        let link = container.archive_link.as_str();
        let filename = recovered_filename(link);

        // Links minted by our own migrator map straight back onto the
        // archive backend; anything else is fetched over HTTP.
        let locator = self.internal_locator(link).unwrap_or_else(|| link.to_string());
        let bytes = self.transport.read_bytes(&locator).await.map_err(|source| {
            RecoveryError::ArchiveUnreachable {
                url: link.to_string(),
                source,
            }
        })?;
        debug!(container = container_id, bytes = bytes.len(), "fetched archived payload");

        fs::create_dir_all(&self.staging_dir).await?;
        let local_path = self.staging_dir.join(RECOVERED_FILE_NAME);
        fs::write(&local_path, &bytes).await?;

        let file = self
            .store
            .create_file(&local_path.to_string_lossy(), &filename)
            .await
            .map_err(RecoveryError::AssetCreateFailed)?;
        let asset = self
            .store
            .create_asset(container_id, ROLE_ORIGINAL, file.id, &filename)
            .await
            .map_err(RecoveryError::AssetCreateFailed)?;

        info!(
            container = container_id,
            asset = asset.id,
            filename,
            "recovered archived asset"
        );
        Ok(asset.id)
    }

    /// Reverse-map an external archive URL onto an `archive://` locator when
    /// it was minted under our configured base URL.
    fn internal_locator(&self, link: &str) -> Option<String> {
        link.strip_prefix(&format!("{}/", self.archive_base_url))
            .map(|rest| format!("{ARCHIVE_SCHEME}{rest}"))
    }
}

/// Original filename derived from an archive link: the final `-`-separated
/// segment, matching the `n_{container-id}-{filename}` naming convention.
///
/// Filenames that themselves contain `-` recover only the trailing piece.
/// The convention is kept bit-for-bit for compatibility with links minted by
/// earlier runs; storing the filename explicitly on the container would
/// remove the ambiguity.
pub(crate) fn recovered_filename(link: &str) -> String {
    link.rsplit('-').next().unwrap_or(link).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_final_dash_segment() {
        assert_eq!(
            recovered_filename("https://cdn.example.org/archive/bucket/n_42-x.tif"),
            "x.tif"
        );
    }

    #[test]
    fn dashed_filenames_recover_only_the_trailing_piece() {
        assert_eq!(
            recovered_filename("https://cdn.example.org/archive/bucket/n_42-my-scan.tif"),
            "scan.tif"
        );
    }
}
