//! Represents the raw-bytes record referenced by an asset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A raw-bytes record. The locator's scheme denotes the storage backend
/// holding the payload (`origin://`, `archive://`, or a plain local path).
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct StoredFile {
    /// Record identifier.
    pub id: i64,

    /// Locator URI of the payload.
    pub uri: String,

    /// Original filename of the payload.
    pub filename: String,

    /// When this record was created.
    pub created_at: DateTime<Utc>,
}
