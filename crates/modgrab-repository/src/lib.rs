#![allow(clippy::missing_errors_doc)]

use modgrab_component::{ModQuery, ProjectRef, VersionRecord};
use modgrab_target::Manifest;
use url::Url;

use crate::http::NetworkError;
use crate::local::persist::PersistedEntity;

pub mod http;
mod local;
mod modrinth;
pub use local::*;
pub use modrinth::*;

impl PersistedEntity for Manifest {
    const FILE_PATH: &'static str = "modgrab.yml";
}

/// A remote catalogue of mod projects and their published versions.
pub trait Registry {
    /// Find the project that best matches `query`, as ranked by the registry
    /// itself.
    fn find_project(&self, query: &ModQuery) -> Result<ProjectRef, RegistryError>;

    /// List every published version of the project with this `identifier`.
    fn list_versions(&self, identifier: &str) -> Result<Vec<VersionRecord>, RegistryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("No project matches '{0}'")]
    NotFound(ModQuery),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Failed to decode the response from {url}")]
    Decode {
        url: Url,
        source: serde_json::Error,
    },

    #[error("The registry URL {0} can't have an API path appended to it")]
    InvalidBaseUrl(Url),
}
