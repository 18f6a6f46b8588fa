use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::remote::{FolderRef, RemoteCatalog};

/// Name of the settings document kept alongside the media in the remote
/// folder.
pub const SETTINGS_FILE_NAME: &str = "app_settings.json";

/// Slideshow settings published to the remote folder by the companion
/// uploader. Fetched at most once per session; missing or malformed
/// documents fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    pub display_images: bool,
    pub display_videos: bool,
    /// Wall-clock time each image stays on screen, in milliseconds.
    #[serde(rename = "imageDuration")]
    pub image_duration_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            display_images: true,
            display_videos: true,
            image_duration_ms: 5_000,
        }
    }
}

impl AppSettings {
    pub fn image_duration(&self) -> Duration {
        Duration::from_millis(self.image_duration_ms)
    }
}

/// Fetch the settings document from the remote folder. Any failure — file
/// absent, download error, parse error — yields `None` and the caller runs
/// with defaults; settings must never block startup.
pub async fn fetch<C>(catalog: &C, folder: &FolderRef) -> Option<AppSettings>
where
    C: RemoteCatalog + ?Sized,
{
    let file = match catalog.find_file(folder, SETTINGS_FILE_NAME).await {
        Ok(Some(file)) => file,
        Ok(None) => {
            debug!(name = SETTINGS_FILE_NAME, "no settings document in remote folder");
            return None;
        }
        Err(err) => {
            warn!("settings lookup failed: {err:#}");
            return None;
        }
    };

    let bytes = match catalog.download(&file).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("settings download failed: {err:#}");
            return None;
        }
    };

    match serde_json::from_slice::<AppSettings>(&bytes) {
        Ok(settings) => Some(settings),
        Err(err) => {
            warn!("malformed settings document: {err}");
            None
        }
    }
}
