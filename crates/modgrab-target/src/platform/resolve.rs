use std::cmp::Reverse;

use itertools::Itertools;
use modgrab_component::VersionRecord;

use super::PlatformTarget;

impl PlatformTarget {
    /// Whether `version` declares support for both this target's loader and
    /// its game version.
    #[must_use]
    pub fn is_compatible(&self, version: &VersionRecord) -> bool {
        let loader: &str = self.loader.as_ref();
        let game_version: &str = self.game_version.as_ref();
        version.loaders.contains(loader) && version.game_versions.contains(game_version)
    }

    /// Pick the newest compatible version out of `versions`.
    ///
    /// Modrinth lists versions newest-first, but that's not something the API
    /// promises, so compatible versions are re-sorted by publication date
    /// before picking. The sort is stable: versions published at the same
    /// instant keep the order the registry returned them in, which makes the
    /// choice deterministic for any given input.
    ///
    /// Returns [`None`] if no version is compatible.
    #[must_use]
    pub fn select_version<'v, I>(&self, versions: I) -> Option<&'v VersionRecord>
    where
        I: IntoIterator<Item = &'v VersionRecord>,
    {
        versions
            .into_iter()
            .filter(|version| self.is_compatible(version))
            .sorted_by_key(|version| Reverse(version.published_at))
            .next()
    }
}
