//! AssetResolver — turns a container scope into the migration working set.

use crate::models::candidate::Candidate;
use crate::services::record_store::{RecordResult, RecordStore, Scope};
use tracing::debug;

/// Resolves the candidates of a batch run: one per "original"-role asset
/// whose owning container is directly in scope.
///
/// The scope must already be the fully expanded container set — membership
/// is checked against the direct owner only, never transitively. Callers
/// scoping by collection must include leaf-level ids explicitly (or pass
/// [`Scope::All`]).
#[derive(Clone)]
pub struct AssetResolver {
    store: RecordStore,
}

impl AssetResolver {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Pure read; ordering is deterministic for a fixed snapshot (by asset id).
    pub async fn resolve(&self, scope: &Scope) -> RecordResult<Vec<Candidate>> {
        let candidates = self.store.candidates(scope).await?;
        debug!(count = candidates.len(), "resolved migration candidates");
        Ok(candidates)
    }
}
