use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Remote source connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RemoteOptions {
    /// Base URL of the catalog service.
    pub base_url: String,
    /// Optional bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
    /// Display name of the remote folder holding the media set.
    pub folder: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    /// Root directory of the local media library (per-kind subdirectories
    /// are created underneath).
    pub library_path: PathBuf,
    pub remote: RemoteOptions,
    /// How often the sync task re-fetches the remote listing.
    #[serde(
        default = "Configuration::default_sync_interval",
        with = "humantime_serde"
    )]
    pub sync_interval: Duration,
    /// Simulated playback length used by the logging render surface.
    #[serde(
        default = "Configuration::default_simulated_video_duration",
        with = "humantime_serde"
    )]
    pub simulated_video_duration: Duration,
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(&path).with_context(|| {
            format!("reading configuration file {}", path.as_ref().display())
        })?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde
    /// defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.library_path.as_os_str().is_empty(),
            "library-path must not be empty"
        );
        ensure!(
            !self.remote.base_url.trim().is_empty(),
            "remote.base-url must not be empty"
        );
        ensure!(
            !self.remote.folder.trim().is_empty(),
            "remote.folder must not be empty"
        );
        ensure!(
            !self.sync_interval.is_zero(),
            "sync-interval must be greater than zero"
        );
        ensure!(
            !self.simulated_video_duration.is_zero(),
            "simulated-video-duration must be greater than zero"
        );
        Ok(self)
    }

    fn default_sync_interval() -> Duration {
        Duration::from_secs(5 * 60)
    }

    fn default_simulated_video_duration() -> Duration {
        Duration::from_secs(30)
    }
}
