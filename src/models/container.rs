//! Represents a hierarchical content record that may own child containers
//! and assets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A hierarchical record (a collection, an issue, a book, ...).
///
/// Containers form a tree through the `parent_id` member-of relation. The
/// backing store does not enforce acyclicity, so traversal code must defend
/// against cycles.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Container {
    /// Record identifier.
    pub id: i64,

    /// Human-readable title.
    pub title: String,

    /// Type marker deciding whether this record is container-like
    /// (eligible to have children enumerated during traversal).
    pub model: String,

    /// Identifier of the parent container, if any (member-of relation).
    pub parent_id: Option<i64>,

    /// Externally resolvable URL of the archived original asset.
    /// Empty until a migration run populates it.
    pub archive_link: String,

    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl Container {
    /// True once a migration run has populated the archive link.
    pub fn is_archived(&self) -> bool {
        !self.archive_link.is_empty()
    }
}
