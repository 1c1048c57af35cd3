//! ArchivePipeline — wires traversal, resolution, and the migration batch
//! into one run, and condenses the result into an operator-facing summary.

use crate::services::{
    expander::CollectionExpander,
    migrator::{ArchiveMigrator, BatchReport},
    record_store::{RecordError, Scope},
    resolver::AssetResolver,
};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Scope supplied by a trigger surface.
#[derive(Clone, Debug)]
pub enum RunScope {
    /// Entire corpus; traversal is skipped.
    All,
    /// One or more root containers, expanded to their transitive closure.
    Roots(Vec<i64>),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Traversal or resolution failed; the run aborts with no candidates
    /// processed.
    #[error("scope query failed: {0}")]
    QueryFailed(#[from] RecordError),
}

/// One failed candidate, with enough identifying fields for an operator to
/// re-run the affected scope or investigate manually.
#[derive(Debug, Clone, Serialize)]
pub struct FailureDetail {
    pub container_id: i64,
    pub asset_id: i64,
    pub file_id: i64,
    pub kind: String,
    pub error: String,
}

/// Per-run report for the trigger surface.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub found: usize,
    pub archived: usize,
    pub failed: usize,
    pub cleanup_incomplete: usize,
    pub skipped: usize,
    pub failures: Vec<FailureDetail>,
}

impl RunSummary {
    fn from_report(report: &BatchReport) -> Self {
        let failures = report
            .units
            .iter()
            .filter_map(|unit| match &unit.outcome {
                Ok(_) => None,
                Err(err) => Some(FailureDetail {
                    container_id: unit.candidate.container_id,
                    asset_id: unit.candidate.asset_id,
                    file_id: unit.candidate.file_id,
                    kind: err.kind().to_string(),
                    error: err.to_string(),
                }),
            })
            .collect();

        Self {
            found: report.units.len() + report.skipped,
            archived: report.archived() + report.cleanup_incomplete(),
            failed: report.failed(),
            cleanup_incomplete: report.cleanup_incomplete(),
            skipped: report.skipped,
            failures,
        }
    }
}

#[derive(Clone)]
pub struct ArchivePipeline {
    expander: CollectionExpander,
    resolver: AssetResolver,
    migrator: ArchiveMigrator,
    container_models: Vec<String>,
}

impl ArchivePipeline {
    pub fn new(
        expander: CollectionExpander,
        resolver: AssetResolver,
        migrator: ArchiveMigrator,
        container_models: Vec<String>,
    ) -> Self {
        Self {
            expander,
            resolver,
            migrator,
            container_models,
        }
    }

    /// Run one archival batch over the given scope.
    ///
    /// Traversal/resolution errors abort the whole run; per-candidate errors
    /// are captured in the summary and never abort siblings.
    pub async fn run(
        &self,
        scope: RunScope,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, PipelineError> {
        let scope = match scope {
            RunScope::All => Scope::All,
            RunScope::Roots(roots) => {
                let expanded = self
                    .expander
                    .expand(&roots, &self.container_models)
                    .await?;
                let mut ids: Vec<i64> = expanded.into_iter().collect();
                ids.sort_unstable();
                info!(containers = ids.len(), "expanded root scope");
                Scope::Containers(ids)
            }
        };

        let candidates = self.resolver.resolve(&scope).await?;
        info!(found = candidates.len(), "starting archival batch");

        let report = self.migrator.migrate_batch(candidates, cancel).await;
        let summary = RunSummary::from_report(&report);
        info!(
            found = summary.found,
            archived = summary.archived,
            failed = summary.failed,
            cleanup_incomplete = summary.cleanup_incomplete,
            "archival batch finished"
        );
        Ok(summary)
    }
}
