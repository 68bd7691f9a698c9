use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use modgrab_component::VersionRecord;
use modgrab_target::settings::Settings;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::http::{HttpClient, NetworkError, Request, Transport};

pub mod persist;

/// The directory fetched artifacts end up in.
///
/// Artifacts are only ever added to it. Whether an artifact is "already
/// there" is decided by its file name alone, so a changed artifact that kept
/// its name will never be fetched again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModsDirectory {
    root_directory: PathBuf,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to open the destination directory {path:?}")]
pub struct DirectoryError {
    source: io::Error,
    pub path: PathBuf,
}

impl ModsDirectory {
    pub const PARTIAL_FILE_EXTENSION: &str = "part";

    /// "Open" the directory at `root_directory`, creating it if needed.
    ///
    /// # Errors
    ///
    /// This function will return an error if the directory can't be created
    /// or canonicalized. See [`std::fs::canonicalize`] for more information
    /// on that.
    pub fn open(root_directory: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = root_directory.as_ref();
        let io_error = |source| DirectoryError {
            source,
            path: path.to_path_buf(),
        };
        fs::create_dir_all(path).map_err(io_error)?;
        let root_directory = path.canonicalize().map_err(io_error)?;
        Ok(Self { root_directory })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root_directory
    }

    /// Where an artifact named `file_name` lives.
    ///
    /// # Errors
    ///
    /// Fails with [`DownloadError::InvalidFileName`] unless `file_name` is a
    /// single plain path component, so nothing is ever written outside of
    /// this directory.
    pub fn artifact_path(&self, file_name: &str) -> Result<PathBuf, DownloadError> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name.to_str() == Some(file_name) => {
                Ok(self.root_directory.join(name))
            }
            _ => Err(DownloadError::InvalidFileName(file_name.to_string())),
        }
    }

    /// Whether an artifact named `file_name` is already in this directory.
    ///
    /// This is an existence check and nothing more, no sizes or hashes are
    /// compared.
    #[must_use]
    pub fn is_present(&self, file_name: &str) -> bool {
        self.artifact_path(file_name)
            .is_ok_and(|path| fs::exists(path).is_ok_and(|exists| exists))
    }

    /// Where an artifact named `file_name` is written to while it's being
    /// downloaded. It is hidden and suffixed, so [`Self::is_present`] never
    /// mistakes it for the real thing.
    fn partial_path(&self, file_name: &str) -> PathBuf {
        self.root_directory.join(format!(
            ".{file_name}.{ext}",
            ext = Self::PARTIAL_FILE_EXTENSION
        ))
    }
}

/// What [`Fetcher::download`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Downloaded { bytes: u64 },
    SkippedExisting,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("Refusing to write {0:?}, it is not a plain file name")]
    InvalidFileName(String),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("An I/O error occurred, path at fault: {path:?}")]
    Io { source: io::Error, path: PathBuf },

    #[error("Expected {expected} bytes, but the server sent {received}")]
    Incomplete { expected: u64, received: u64 },
}

/// Puts artifacts into a destination directory.
pub trait Fetcher {
    fn is_present(&self, file_name: &str) -> bool;

    /// Fetch the artifact of `version`, unless a file with the same name is
    /// already present.
    fn download(&self, version: &VersionRecord) -> Result<FetchStatus, DownloadError>;
}

/// A [`Fetcher`] that downloads artifacts over HTTP into a [`ModsDirectory`].
#[derive(Debug, Clone)]
#[must_use]
pub struct ArtifactFetcher<T = reqwest::blocking::Client> {
    client: HttpClient<T>,
    directory: ModsDirectory,
    timeout: Duration,
}

impl<T: Transport> ArtifactFetcher<T> {
    /// Each download attempt is given [`Settings::download_timeout`].
    pub const fn new(client: HttpClient<T>, directory: ModsDirectory, settings: &Settings) -> Self {
        Self {
            client,
            directory,
            timeout: settings.download_timeout,
        }
    }

    #[must_use]
    pub const fn directory(&self) -> &ModsDirectory {
        &self.directory
    }
}

impl<T: Transport> Fetcher for ArtifactFetcher<T> {
    fn is_present(&self, file_name: &str) -> bool {
        self.directory.is_present(file_name)
    }

    #[instrument(skip_all, fields(file = %version.file_name))]
    fn download(&self, version: &VersionRecord) -> Result<FetchStatus, DownloadError> {
        let destination = self.directory.artifact_path(&version.file_name)?;
        if self.is_present(&version.file_name) {
            tracing::info!(path = ?destination, "Already present, skipping");
            return Ok(FetchStatus::SkippedExisting);
        }

        tracing::info!(url = %version.download_url, "Downloading");
        let request = Request::get(version.download_url.clone(), self.timeout);
        let mut response = self.client.execute(&request)?;

        let partial = self.directory.partial_path(&version.file_name);
        let result = write_body(&mut response, &partial).and_then(|received| {
            if let Some(expected) = version.file_size.filter(|&expected| expected != received) {
                return Err(DownloadError::Incomplete { expected, received });
            }
            fs::rename(&partial, &destination).map_err(|source| DownloadError::Io {
                source,
                path: destination.clone(),
            })?;
            Ok(received)
        });

        match result {
            Ok(bytes) => {
                tracing::info!(path = ?destination, bytes, "Downloaded");
                Ok(FetchStatus::Downloaded { bytes })
            }
            Err(error) => {
                match fs::remove_file(&partial) {
                    Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                        tracing::warn!(path = ?partial, %cleanup, "Failed to remove a partial download");
                    }
                    _ => {}
                }
                Err(error)
            }
        }
    }
}

/// Stream `body` into a freshly created file at `path`.
fn write_body<R: Read>(body: &mut R, path: &Path) -> Result<u64, DownloadError> {
    let io_error = |source| DownloadError::Io {
        source,
        path: path.to_path_buf(),
    };
    let mut file = fs::File::create(path).map_err(io_error)?;
    let received = io::copy(body, &mut file).map_err(io_error)?;
    file.sync_all().map_err(io_error)?;
    Ok(received)
}
