use std::time::Duration;

use modgrab_component::{ModQuery, ProjectRef, VersionRecord};
use modgrab_target::settings::Settings;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::http::{HttpClient, Request, Transport};
use crate::{Registry, RegistryError};

pub mod models;

/// A struct that represents the remote [modrinth](https://modrinth.com) repository.
#[derive(Debug, Clone)]
#[must_use]
pub struct ModrinthRepository<T = reqwest::blocking::Client> {
    client: HttpClient<T>,
    base_url: Url,
    timeout: Duration,
}

impl<T: Transport> ModrinthRepository<T> {
    /// Talk to the registry at [`Settings::registry_url`], giving up on each
    /// attempt after [`Settings::metadata_timeout`].
    pub fn new(client: HttpClient<T>, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.registry_url.clone(),
            timeout: settings.metadata_timeout,
        }
    }

    /// Build the URL of an API endpoint, percent-encoding every segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn fetch_json<D>(&self, request: &Request) -> Result<D, RegistryError>
    where
        D: DeserializeOwned,
    {
        tracing::debug!(url = %request.url, query = ?request.query, "Querying the registry");
        let response = self.client.execute(request)?;
        serde_json::from_reader(response).map_err(|source| RegistryError::Decode {
            url: request.url.clone(),
            source,
        })
    }
}

impl<T: Transport> Registry for ModrinthRepository<T> {
    #[instrument(skip_all, fields(query = %query))]
    fn find_project(&self, query: &ModQuery) -> Result<ProjectRef, RegistryError> {
        let url = self.endpoint(&["search"])?;
        let request = Request::get(url, self.timeout).with_query("query", query.to_string());
        let results: models::SearchResults = self.fetch_json(&request)?;
        let project = results
            .hits
            .into_iter()
            .next()
            .map(ProjectRef::from)
            .ok_or_else(|| RegistryError::NotFound(query.clone()))?;
        tracing::info!(%project, "Found a matching project");
        Ok(project)
    }

    #[instrument(skip(self))]
    fn list_versions(&self, identifier: &str) -> Result<Vec<VersionRecord>, RegistryError> {
        let url = self.endpoint(&["project", identifier, "version"])?;
        let request = Request::get(url, self.timeout);
        let versions: Vec<models::Version> = self.fetch_json(&request)?;
        let listed = versions.len();
        let records = versions
            .into_iter()
            .filter_map(|version| {
                let id = version.id.clone();
                let record = version.into_record();
                if record.is_none() {
                    tracing::warn!(version = %id, "Skipping a version that has no files");
                }
                record
            })
            .collect::<Vec<_>>();
        tracing::info!(listed, usable = records.len(), "Fetched project versions");
        Ok(records)
    }
}
