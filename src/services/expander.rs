//! CollectionExpander — breadth-first closure over the container hierarchy.

use crate::services::record_store::{RecordResult, RecordStore};
use std::collections::HashSet;
use tracing::debug;

/// Computes the transitive closure of descendant containers for a set of
/// roots, restricted to container-like type markers.
#[derive(Clone)]
pub struct CollectionExpander {
    store: RecordStore,
}

impl CollectionExpander {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// Expand `roots` to the full set of reachable container-like records,
    /// roots included.
    ///
    /// Each round queries the children of the current frontier whose type
    /// marker is in `markers`; identifiers already accumulated are never
    /// re-visited, so the loop terminates even when the member-of relation
    /// contains a cycle. Read-only; query errors propagate without retry.
    pub async fn expand(&self, roots: &[i64], markers: &[String]) -> RecordResult<HashSet<i64>> {
        let mut accumulated: HashSet<i64> = roots.iter().copied().collect();
        let mut frontier: Vec<i64> = roots.to_vec();

        while !frontier.is_empty() {
            let children = self.store.child_containers(&frontier, markers).await?;
            frontier = children
                .into_iter()
                .filter(|id| accumulated.insert(*id))
                .collect();
            if !frontier.is_empty() {
                debug!(new = frontier.len(), "expanded one hierarchy level");
            }
        }

        Ok(accumulated)
    }
}
