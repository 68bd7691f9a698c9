//! This crate is a part of **[Modgrab]**.
//!
//! ## What lives here?
//!
//! The records that flow through the resolve-and-fetch pipeline: what the user
//! asked for ([`ModQuery`]), what the registry matched it to ([`ProjectRef`])
//! and the published versions of that project ([`VersionRecord`]).
//!
//! This crate does not talk to the network or the filesystem, and it knows
//! nothing about the platform a mod is being fetched for. See `modgrab-target`
//! for compatibility checks and `modgrab-repository` for the I/O.
//!
//! [Modgrab]: https://github.com/exoumoon/modgrab

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use nutype::nutype;
use serde::{Deserialize, Serialize};
use url::Url;

/// A human-readable mod name, as the user typed it.
///
/// Leading and trailing whitespace is dropped, and an empty name is rejected,
/// since the registry would happily answer an empty search with its most
/// popular project.
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(
        TryFrom,
        FromStr,
        AsRef,
        Serialize,
        Deserialize,
        PartialEq,
        Eq,
        Hash,
        Display,
        Clone,
        Debug,
    )
)]
pub struct ModQuery(String);

/// A project the registry matched a [`ModQuery`] to.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[must_use]
pub struct ProjectRef {
    /// The stable key used for every later lookup (Modrinth's slug).
    pub identifier: String,
    pub display_name: String,
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} [{}]", self.display_name, self.identifier)
    }
}

/// A single published version of a project, reduced to its downloadable
/// artifact and the platforms it declares support for.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[must_use]
pub struct VersionRecord {
    pub version_id: String,
    pub version_number: String,
    pub file_name: String,
    pub download_url: Url,
    /// Size of the artifact in bytes, if the registry advertised one.
    pub file_size: Option<u64>,
    pub loaders: HashSet<String>,
    pub game_versions: HashSet<String>,
    pub published_at: DateTime<Utc>,
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{number} [ID: {id}] {file}, released: {date}",
            number = self.version_number,
            id = self.version_id,
            file = self.file_name,
            date = self.published_at.format("%b %e, %Y"),
        )
    }
}
