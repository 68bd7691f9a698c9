use std::collections::HashSet;

use chrono::{DateTime, Utc};
use modgrab_component::{ProjectRef, VersionRecord};
use serde::Deserialize;
use url::Url;

/// The body of `GET /search`.
#[derive(Deserialize, Debug)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
}

#[derive(Deserialize, Debug)]
pub struct SearchHit {
    pub project_id: String,
    pub slug: Option<String>,
    pub title: String,
}

impl From<SearchHit> for ProjectRef {
    fn from(hit: SearchHit) -> Self {
        Self {
            identifier: hit.slug.unwrap_or(hit.project_id),
            display_name: hit.title,
        }
    }
}

/// An element of the body of `GET /project/{id}/version`.
#[derive(Deserialize, Debug)]
pub struct Version {
    pub id: String,
    pub version_number: String,
    pub game_versions: HashSet<String>,
    pub loaders: HashSet<String>,
    pub date_published: DateTime<Utc>,
    pub files: Vec<File>,
}

impl Version {
    /// The file flagged as primary, or the first one if none is.
    #[must_use]
    pub fn primary_file(&self) -> Option<&File> {
        self.files
            .iter()
            .find(|file| file.primary)
            .or_else(|| self.files.first())
    }

    /// Reduce this version to its primary artifact.
    ///
    /// Returns [`None`] if the version has no files at all, which Modrinth
    /// does allow for some reason.
    #[must_use]
    pub fn into_record(self) -> Option<VersionRecord> {
        let File {
            url, name, size, ..
        } = self.primary_file()?.clone();
        Some(VersionRecord {
            version_id: self.id,
            version_number: self.version_number,
            file_name: name,
            download_url: url,
            file_size: size,
            loaders: self.loaders,
            game_versions: self.game_versions,
            published_at: self.date_published,
        })
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct File {
    pub url: Url,
    #[serde(rename = "filename")]
    pub name: String,
    #[serde(default)]
    pub primary: bool,
    pub size: Option<u64>,
}
