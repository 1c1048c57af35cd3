//! Represents a binary-bearing metadata record owned by one container.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The distinguished role tag marking an asset as eligible for migration.
pub const ROLE_ORIGINAL: &str = "original";

/// A metadata record tying a raw-bytes [`StoredFile`](super::file::StoredFile)
/// to its owning container, tagged with a usage role.
///
/// Only assets with role [`ROLE_ORIGINAL`] are migration candidates; roles
/// like `"derivative"` or `"thumbnail"` are never archived.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Asset {
    /// Record identifier.
    pub id: i64,

    /// Identifier of the owning container.
    pub container_id: i64,

    /// Usage role tag (e.g. "original", "derivative", "thumbnail").
    pub use_role: String,

    /// Identifier of the underlying file record.
    pub file_id: i64,

    /// Display title; recovery sets this to the recovered filename.
    pub title: String,

    /// When this record was created.
    pub created_at: DateTime<Utc>,
}
