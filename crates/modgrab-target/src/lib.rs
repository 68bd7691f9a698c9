use std::path::PathBuf;
use std::time::Duration;

use modgrab_component::ModQuery;
use serde::{Deserialize, Serialize};
use settings::Settings;

use crate::platform::{GameVersion, Loader, PlatformTarget};

pub mod platform;
pub mod settings;

/// The top-level **run configuration**: where to put mods, what platform to
/// fetch them for, and which mods to fetch.
///
/// Built once at startup and only ever passed around by reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Manifest {
    #[serde(default = "Manifest::default_destination")]
    pub destination: PathBuf,
    pub target: PlatformTarget,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub mods: Vec<ModQuery>,
}

/// Values given on the command line, which take precedence over whatever a
/// [`Manifest`] file says.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub destination: Option<PathBuf>,
    pub loader: Option<Loader>,
    pub game_version: Option<GameVersion>,
    pub metadata_timeout: Option<Duration>,
    pub download_timeout: Option<Duration>,
    /// Appended to the manifest's own list, not replacing it.
    pub mods: Vec<ModQuery>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("No {0} was configured")]
    Missing(&'static str),
    #[error("The list of mods to fetch is empty")]
    NoMods,
}

impl Manifest {
    pub const DEFAULT_DESTINATION: &'static str = "mods";

    fn default_destination() -> PathBuf {
        PathBuf::from(Self::DEFAULT_DESTINATION)
    }

    /// Merge an optional `base` manifest with command-line `overrides`.
    ///
    /// # Errors
    ///
    /// This function will return an error if neither source provides a loader
    /// or a game version, or if the merged mod list ends up empty.
    pub fn resolve(base: Option<Self>, overrides: Overrides) -> Result<Self, ManifestError> {
        let Overrides {
            destination,
            loader,
            game_version,
            metadata_timeout,
            download_timeout,
            mods,
        } = overrides;

        let mut manifest = match base {
            Some(mut manifest) => {
                if let Some(loader) = loader {
                    manifest.target.loader = loader;
                }
                if let Some(game_version) = game_version {
                    manifest.target.game_version = game_version;
                }
                if let Some(destination) = destination {
                    manifest.destination = destination;
                }
                manifest
            }
            None => Self {
                destination: destination.unwrap_or_else(Self::default_destination),
                target: PlatformTarget::new(
                    loader.ok_or(ManifestError::Missing("loader"))?,
                    game_version.ok_or(ManifestError::Missing("game version"))?,
                ),
                settings: Settings::default(),
                mods: vec![],
            },
        };

        if let Some(timeout) = metadata_timeout {
            manifest.settings.metadata_timeout = timeout;
        }
        if let Some(timeout) = download_timeout {
            manifest.settings.download_timeout = timeout;
        }
        manifest.mods.extend(mods);

        if manifest.mods.is_empty() {
            return Err(ManifestError::NoMods);
        }

        Ok(manifest)
    }
}

/// Parse a plain-text mod list: one display name per line, blank lines and
/// lines starting with `#` are skipped.
#[must_use]
pub fn parse_mod_list(contents: &str) -> Vec<ModQuery> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| ModQuery::try_new(line.to_string()).ok())
        .collect()
}
