use std::error::Error;

use modgrab_component::{ModQuery, ProjectRef};
use serde::Serialize;

/// How the pipeline ended for a single mod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Status {
    Downloaded,
    SkippedExisting,
    NoCompatibleVersion,
    NotFound,
    Failed,
}

impl Status {
    /// Whether the mod is in the destination directory after the run.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Downloaded | Self::SkippedExisting)
    }
}

/// The one and only result of processing a single [`ModQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct DownloadOutcome {
    #[serde(rename = "mod")]
    pub query: ModQuery,
    pub status: Status,
    /// What went wrong, for anything but a success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The project the query resolved to, if it got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectRef>,
    /// The artifact that was picked, if it got that far.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl DownloadOutcome {
    pub const fn new(query: ModQuery, status: Status) -> Self {
        Self {
            query,
            status,
            detail: None,
            project: None,
            file_name: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Use `error` and everything that caused it as the detail.
    pub fn with_error(self, error: &dyn Error) -> Self {
        let mut detail = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        self.with_detail(detail)
    }

    pub fn with_project(mut self, project: Option<ProjectRef>) -> Self {
        self.project = project;
        self
    }

    pub fn with_file_name(mut self, file_name: Option<String>) -> Self {
        self.file_name = file_name;
        self
    }
}

/// Aggregate counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[must_use]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Every mod that didn't end up in the destination, in input order.
    pub failed_mods: Vec<ModQuery>,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        outcomes.iter().fold(Self::default(), |mut summary, outcome| {
            summary.total += 1;
            match outcome.status {
                Status::Downloaded => summary.succeeded += 1,
                Status::SkippedExisting => summary.skipped += 1,
                Status::NoCompatibleVersion | Status::NotFound | Status::Failed => {
                    summary.failed += 1;
                    summary.failed_mods.push(outcome.query.clone());
                }
            }
            summary
        })
    }
}

/// Everything a batch produced: one outcome per requested mod, in the order
/// they were requested, plus a [`Summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[must_use]
pub struct Report {
    pub outcomes: Vec<DownloadOutcome>,
    pub summary: Summary,
}

impl From<Vec<DownloadOutcome>> for Report {
    fn from(outcomes: Vec<DownloadOutcome>) -> Self {
        let summary = Summary::from_outcomes(&outcomes);
        Self { outcomes, summary }
    }
}
