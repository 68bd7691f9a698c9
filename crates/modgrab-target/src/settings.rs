//! Tunables for talking to the registry.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};
use url::Url;

#[serde_as]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the registry's API, without a trailing slash.
    pub registry_url: Url,

    /// Timeout for search and version listing requests.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub metadata_timeout: Duration,

    /// Timeout for artifact downloads. These are jars of a few megabytes, so
    /// this is way more generous than [`Self::metadata_timeout`].
    #[serde_as(as = "DurationSeconds<u64>")]
    pub download_timeout: Duration,

    /// How many times a failed read request is retried before giving up.
    pub max_retries: u32,

    /// Delay before the first retry, doubled for every one after that.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub initial_backoff: Duration,
}

impl Settings {
    pub const DEFAULT_REGISTRY_URL: &str = "https://api.modrinth.com/v2";
    pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: Url::parse(Self::DEFAULT_REGISTRY_URL)
                .expect("The default registry URL should always be valid"),
            metadata_timeout: Self::DEFAULT_METADATA_TIMEOUT,
            download_timeout: Self::DEFAULT_DOWNLOAD_TIMEOUT,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            initial_backoff: Self::DEFAULT_INITIAL_BACKOFF,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Settings;

    #[test]
    fn missing_fields_fall_back_to_defaults() -> color_eyre::Result<()> {
        let settings: Settings = serde_yml::from_str("download_timeout: 120\n")?;
        assert_eq!(settings.download_timeout, Duration::from_secs(120));
        assert_eq!(settings.metadata_timeout, Duration::from_secs(10));
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.registry_url.as_str(), "https://api.modrinth.com/v2");
        Ok(())
    }

    #[test]
    fn durations_are_written_as_seconds() -> color_eyre::Result<()> {
        let yml = serde_yml::to_string(&Settings::default())?;
        assert!(yml.contains("metadata_timeout: 10"));
        assert!(yml.contains("download_timeout: 30"));
        assert!(yml.contains("initial_backoff: 1"));
        Ok(())
    }
}
