//! ByteTransport — scheme-dispatched access to payload bytes.
//!
//! Locators come in four shapes:
//! - `origin://{path}`  — the primary (slow/costly) backend, a local root dir
//! - `archive://{path}` — the archive backend, a local root dir
//! - `http(s)://...`    — externally resolvable URLs (recovery fetch)
//! - anything else      — a plain local filesystem path

use bytes::Bytes;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::fs::{self, File};

/// Scheme prefix of locators in the primary backend.
pub const ORIGIN_SCHEME: &str = "origin://";

/// Scheme prefix of locators in the archive backend.
pub const ARCHIVE_SCHEME: &str = "archive://";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("locator `{0}` is not locally resolvable")]
    NotLocal(String),
    #[error("fetching `{url}` failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

#[derive(Clone)]
pub struct ByteTransport {
    origin_root: PathBuf,
    archive_root: PathBuf,
    http: reqwest::Client,
}

impl ByteTransport {
    pub fn new(origin_root: impl Into<PathBuf>, archive_root: impl Into<PathBuf>) -> Self {
        Self {
            origin_root: origin_root.into(),
            archive_root: archive_root.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Map a locator to the local path holding its bytes.
    ///
    /// `http(s)` locators have no local path and return `NotLocal`.
    pub fn resolve_path(&self, uri: &str) -> TransportResult<PathBuf> {
        if let Some(rest) = uri.strip_prefix(ORIGIN_SCHEME) {
            Ok(self.origin_root.join(rest))
        } else if let Some(rest) = uri.strip_prefix(ARCHIVE_SCHEME) {
            Ok(self.archive_root.join(rest))
        } else if uri.starts_with("http://") || uri.starts_with("https://") {
            Err(TransportError::NotLocal(uri.to_string()))
        } else {
            Ok(PathBuf::from(uri))
        }
    }

    /// Open a streaming reader at a local-scheme locator.
    pub async fn open_read(&self, uri: &str) -> TransportResult<File> {
        let path = self.resolve_path(uri)?;
        Ok(File::open(&path).await?)
    }

    /// Fetch the full byte content at a locator, dispatching on scheme.
    pub async fn read_bytes(&self, uri: &str) -> TransportResult<Bytes> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            let response = self
                .http
                .get(uri)
                .send()
                .await
                .and_then(|resp| resp.error_for_status())
                .map_err(|source| TransportError::Http {
                    url: uri.to_string(),
                    source,
                })?;
            response.bytes().await.map_err(|source| TransportError::Http {
                url: uri.to_string(),
                source,
            })
        } else {
            let path = self.resolve_path(uri)?;
            Ok(fs::read(&path).await?.into())
        }
    }

    /// Remove the local payload behind a locator. Missing files are fine.
    pub async fn remove(&self, uri: &str) -> TransportResult<()> {
        let path = self.resolve_path(uri)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    pub fn origin_root(&self) -> &Path {
        &self.origin_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_origin_and_archive_schemes_under_their_roots() {
        let transport = ByteTransport::new("/data/origin", "/data/archive");
        assert_eq!(
            transport.resolve_path("origin://bucket/x.tif").unwrap(),
            PathBuf::from("/data/origin/bucket/x.tif")
        );
        assert_eq!(
            transport.resolve_path("archive://bucket/n_1-x.tif").unwrap(),
            PathBuf::from("/data/archive/bucket/n_1-x.tif")
        );
    }

    #[test]
    fn plain_paths_pass_through() {
        let transport = ByteTransport::new("/data/origin", "/data/archive");
        assert_eq!(
            transport.resolve_path("/tmp/staging/recovered").unwrap(),
            PathBuf::from("/tmp/staging/recovered")
        );
    }

    #[test]
    fn http_locators_are_not_local() {
        let transport = ByteTransport::new("/data/origin", "/data/archive");
        assert!(matches!(
            transport.resolve_path("https://archive.example.org/bucket/n_1-x.tif"),
            Err(TransportError::NotLocal(_))
        ));
    }
}
