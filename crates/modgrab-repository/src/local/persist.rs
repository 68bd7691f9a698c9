use std::path::{Path, PathBuf};
use std::{fs, io};

use modgrab_component::ModQuery;
use serde::de::DeserializeOwned;

#[derive(thiserror::Error, Debug)]
#[must_use]
pub enum PersistError {
    #[error("An I/O error occurred, path at fault: {path:?}")]
    Io {
        source: io::Error,
        path: Option<PathBuf>,
    },

    #[error("Failed to deserialize data from YAML")]
    SerdeYml(#[from] serde_yml::Error),
}

impl PersistError {
    pub const fn io(source: io::Error, path: PathBuf) -> Self {
        Self::Io {
            source,
            path: Some(path),
        }
    }
}

/// A trait that represents an entity (type) that is read from a file.
pub trait PersistedEntity: DeserializeOwned {
    /// The path to the file this entity is read from by default.
    const FILE_PATH: &'static str;

    /// Deserializes an instance of [`Self`] from [`Self::FILE_PATH`].
    ///
    /// # Errors
    ///
    /// See [`Self::read_from`].
    fn read() -> Result<Self, PersistError> {
        Self::read_from(Self::FILE_PATH)
    }

    /// Deserializes an instance of [`Self`] from the file at `path`.
    ///
    /// # Errors
    ///
    /// This function will return an error if there is an error reading `path`
    /// or an error occurs when deserializing its contents into [`Self`].
    fn read_from(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let path = path.as_ref();
        let yml = fs::read_to_string(path)
            .map_err(|source| PersistError::io(source, path.to_path_buf()))?;
        let entity = serde_yml::from_str(&yml)?;
        Ok(entity)
    }
}

/// Read a plain-text mod list, see [`modgrab_target::parse_mod_list`].
///
/// # Errors
///
/// This function will return an error if `path` can't be read.
pub fn read_mod_list(path: impl AsRef<Path>) -> Result<Vec<ModQuery>, PersistError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|source| PersistError::io(source, path.to_path_buf()))?;
    Ok(modgrab_target::parse_mod_list(&contents))
}
