//! Transient description of one migration unit of work.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the resolver's working set: the exactly-one "original" asset
/// of a container in scope, together with its file locator.
///
/// Candidates are created, consumed, and discarded per batch run; they carry
/// no state across runs and are never persisted.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Identifier of the owning container (rewrite target).
    pub container_id: i64,

    /// Identifier of the asset metadata record (deleted on cleanup).
    pub asset_id: i64,

    /// Identifier of the underlying file record (deleted on cleanup).
    pub file_id: i64,

    /// Current locator of the payload bytes.
    pub uri: String,

    /// Original filename of the payload.
    pub filename: String,
}
