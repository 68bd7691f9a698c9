use std::fmt;

use nutype::nutype;
use serde::{Deserialize, Serialize};

/// Version selection against a [`PlatformTarget`].
pub mod resolve;

/// The platform mods are being fetched for: **one** loader and **one** game
/// version.
///
/// Unlike a full modpack instance, a target carries no notion of "foreign"
/// loaders that happen to work through a compatibility layer. A version either
/// declares support for exactly this loader and game version, or it is not
/// compatible at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct PlatformTarget {
    pub loader: Loader,
    pub game_version: GameVersion,
}

impl PlatformTarget {
    pub const fn new(loader: Loader, game_version: GameVersion) -> Self {
        Self {
            loader,
            game_version,
        }
    }
}

impl fmt::Display for PlatformTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {}", self.loader, self.game_version)
    }
}

/// A game version, exactly as the registry spells it (`1.21.11`, `24w14a`).
///
/// Never parsed into anything smarter. The registry lists versions as plain
/// strings and they are only ever compared for equality.
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
pub struct GameVersion(String);

/// Possible modloaders a [`PlatformTarget`] can be built upon.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum::EnumIter,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Loader {
    /// The [**Fabric**](https://fabricmc.net) modloader.
    Fabric,

    /// The [**Forge**](https://minecraftforge.net) modloader.
    Forge,

    /// The [**NeoForge**](https://neoforged.net) modloader.
    ///
    /// Some Forge mods load on it, but the registry lists those separately, so
    /// we don't treat them as interchangeable.
    Neoforge,

    /// The [**Quilt**](https://quiltmc.org/en) modloader.
    Quilt,
}
