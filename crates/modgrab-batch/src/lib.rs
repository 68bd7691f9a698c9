//! This crate is a part of **[Modgrab]**.
//!
//! It runs the per-mod pipeline over a whole list of mods:
//!
//! ```text
//! Searching ─▶ VersionListing ─▶ Resolving ─▶ Fetching ─▶ Done
//!     │              │               │            │
//!     └──────────────┴───────────────┴────────────┴─────▶ Done
//! ```
//!
//! Every mod ends up with exactly one [`DownloadOutcome`], no matter at which
//! stage it stopped, and a failing mod never stops the ones after it.
//!
//! [Modgrab]: https://github.com/exoumoon/modgrab

use modgrab_component::ModQuery;
use modgrab_repository::{FetchStatus, Fetcher, Registry, RegistryError};
use modgrab_target::platform::PlatformTarget;
use tracing::instrument;

mod report;
pub use report::*;

/// Runs the resolve-and-fetch pipeline for one mod after another.
#[derive(Debug)]
#[must_use]
pub struct Orchestrator<'a, R, F> {
    registry: &'a R,
    fetcher: &'a F,
    target: &'a PlatformTarget,
}

impl<'a, R, F> Orchestrator<'a, R, F>
where
    R: Registry,
    F: Fetcher,
{
    pub const fn new(registry: &'a R, fetcher: &'a F, target: &'a PlatformTarget) -> Self {
        Self {
            registry,
            fetcher,
            target,
        }
    }

    /// Process every query in order, strictly one after another.
    pub fn run<I>(&self, queries: I) -> Report
    where
        I: IntoIterator<Item = ModQuery>,
    {
        let outcomes = queries
            .into_iter()
            .map(|query| self.process(query))
            .collect::<Vec<_>>();
        let report = Report::from(outcomes);
        tracing::info!(
            total = report.summary.total,
            succeeded = report.summary.succeeded,
            skipped = report.summary.skipped,
            failed = report.summary.failed,
            "Batch finished"
        );
        report
    }

    /// Take a single query all the way to its [`DownloadOutcome`].
    #[instrument(skip_all, fields(query = %query, platform = %self.target))]
    pub fn process(&self, query: ModQuery) -> DownloadOutcome {
        // Searching
        let project = match self.registry.find_project(&query) {
            Ok(project) => project,
            Err(error @ RegistryError::NotFound(_)) => {
                tracing::warn!(%error, "No such project");
                return DownloadOutcome::new(query, Status::NotFound).with_error(&error);
            }
            Err(error) => {
                tracing::warn!(%error, "Search failed");
                return DownloadOutcome::new(query, Status::Failed).with_error(&error);
            }
        };

        // VersionListing
        let versions = match self.registry.list_versions(&project.identifier) {
            Ok(versions) => versions,
            Err(error) => {
                tracing::warn!(%error, "Failed to list versions");
                return DownloadOutcome::new(query, Status::Failed)
                    .with_error(&error)
                    .with_project(Some(project));
            }
        };

        // Resolving
        let Some(version) = self.target.select_version(&versions) else {
            tracing::warn!(listed = versions.len(), "No compatible version");
            return DownloadOutcome::new(query, Status::NoCompatibleVersion)
                .with_detail(format!(
                    "None of the {} versions of {project} support {}",
                    versions.len(),
                    self.target
                ))
                .with_project(Some(project));
        };
        tracing::info!(%version, "Selected a version");

        // Fetching
        let status = match self.fetcher.download(version) {
            Ok(FetchStatus::Downloaded { .. }) => Status::Downloaded,
            Ok(FetchStatus::SkippedExisting) => Status::SkippedExisting,
            Err(error) => {
                tracing::warn!(%error, "Download failed");
                return DownloadOutcome::new(query, Status::Failed)
                    .with_error(&error)
                    .with_project(Some(project))
                    .with_file_name(Some(version.file_name.clone()));
            }
        };

        DownloadOutcome::new(query, status)
            .with_project(Some(project))
            .with_file_name(Some(version.file_name.clone()))
    }
}
