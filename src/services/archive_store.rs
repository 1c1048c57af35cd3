//! Archive object store client and staging copier.
//!
//! [`StreamingCopier`] drains a byte stream into a uniquely named file under
//! the staging directory. [`ArchiveStore`] owns the archive root directory
//! and offers idempotent directory creation plus an atomic move into a
//! destination key. Both leave no partially written file referenced by any
//! record: staging writes go to throwaway names, and the archive move only
//! lands complete payloads.

use crate::services::transport::ARCHIVE_SCHEME;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncRead,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("locator `{0}` is not an archive locator")]
    NotArchiveLocator(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Copies a byte stream to a staging file, fsynced before use.
#[derive(Clone)]
pub struct StreamingCopier {
    staging_dir: PathBuf,
}

impl StreamingCopier {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Drain `reader` into a fresh staging file and return its path.
    ///
    /// The file name is unique per call, so concurrent workers staging
    /// same-named payloads never collide. On any write error the partial
    /// file is removed before the error propagates.
    pub async fn stage<R>(&self, reader: &mut R) -> StorageResult<PathBuf>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        fs::create_dir_all(&self.staging_dir).await?;
        let staged = self.staging_dir.join(format!(".stage-{}", Uuid::new_v4()));
        let mut file = File::create(&staged).await?;

        if let Err(err) = tokio::io::copy(reader, &mut file).await {
            let _ = fs::remove_file(&staged).await;
            return Err(StorageError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&staged).await;
            return Err(StorageError::Io(err));
        }

        Ok(staged)
    }
}

/// Client for the archive backend: a directory tree addressed by
/// `archive://` locators.
#[derive(Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Local path of an `archive://` locator.
    pub fn path_for(&self, locator: &str) -> StorageResult<PathBuf> {
        let rest = locator
            .strip_prefix(ARCHIVE_SCHEME)
            .ok_or_else(|| StorageError::NotArchiveLocator(locator.to_string()))?;
        Ok(self.root.join(rest))
    }

    /// Ensure the directory portion of `locator` exists.
    ///
    /// Recursive and idempotent: already-existing directories (including
    /// those created concurrently by sibling workers) are not an error.
    pub async fn ensure_directory(&self, locator: &str) -> StorageResult<()> {
        let rest = locator
            .strip_prefix(ARCHIVE_SCHEME)
            .ok_or_else(|| StorageError::NotArchiveLocator(locator.to_string()))?;
        if rest.is_empty() {
            fs::create_dir_all(&self.root).await?;
        } else {
            fs::create_dir_all(self.root.join(rest)).await?;
        }
        Ok(())
    }

    /// Move a staged file to the destination key, returning the final
    /// `archive://` locator.
    ///
    /// The destination is replaced if it already exists, so re-running a
    /// migration overwrites rather than duplicates (the key is
    /// deterministic). Falls back to copy+remove when staging and archive
    /// live on different filesystems.
    pub async fn move_into(&self, staged: &Path, destination: &str) -> StorageResult<String> {
        let dest_path = self.path_for(destination)?;
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        match fs::rename(staged, &dest_path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                fs::remove_file(&dest_path).await?;
                fs::rename(staged, &dest_path).await?;
            }
            Err(err) if err.kind() == ErrorKind::CrossesDevices => {
                fs::copy(staged, &dest_path).await?;
                fs::remove_file(staged).await?;
            }
            Err(err) => return Err(StorageError::Io(err)),
        }

        debug!(destination, "relocated staged payload into archive");
        Ok(destination.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn stage_writes_stream_to_unique_file() {
        let dir = tempdir().unwrap();
        let copier = StreamingCopier::new(dir.path());
        let mut reader = &b"payload bytes"[..];
        let staged = copier.stage(&mut reader).await.unwrap();
        assert_eq!(fs::read(&staged).await.unwrap(), b"payload bytes");
    }

    #[tokio::test]
    async fn move_into_replaces_existing_destination() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path());
        let copier = StreamingCopier::new(dir.path().join("staging"));

        let mut first = &b"first"[..];
        let staged = copier.stage(&mut first).await.unwrap();
        store
            .move_into(&staged, "archive://bucket/n_1-x.tif")
            .await
            .unwrap();

        let mut second = &b"second"[..];
        let staged = copier.stage(&mut second).await.unwrap();
        let locator = store
            .move_into(&staged, "archive://bucket/n_1-x.tif")
            .await
            .unwrap();

        let path = store.path_for(&locator).unwrap();
        assert_eq!(fs::read(&path).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn ensure_directory_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::new(dir.path());
        store.ensure_directory("archive://a/b").await.unwrap();
        store.ensure_directory("archive://a/b").await.unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }
}
