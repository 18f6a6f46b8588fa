use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use walkdir::WalkDir;

use crate::media::MediaKind;

/// Local persistence for downloaded media.
///
/// `delete` must fail on a missing file: the reconciler only drops a name
/// from the store after a successful delete, so a silent no-op here would
/// let the listing drift from what is actually on disk.
#[async_trait]
pub trait LocalStorage: Send + Sync {
    async fn write(&self, kind: MediaKind, name: &str, bytes: &[u8]) -> Result<()>;

    async fn delete(&self, kind: MediaKind, name: &str) -> Result<()>;

    /// Names currently on disk for a kind. Used once at session start to
    /// seed the media store.
    fn list_names(&self, kind: MediaKind) -> Result<Vec<String>>;

    /// Full path of a stored file, for handing to a render surface.
    fn path_of(&self, kind: MediaKind, name: &str) -> PathBuf;
}

/// Filesystem-backed storage: one flat subdirectory per kind under the
/// configured library root.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for kind in MediaKind::ALL {
            let dir = root.join(kind.subdir());
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating media directory {}", dir.display()))?;
        }
        Ok(Self { root })
    }

    fn kind_dir(&self, kind: MediaKind) -> PathBuf {
        self.root.join(kind.subdir())
    }
}

#[async_trait]
impl LocalStorage for DiskStorage {
    async fn write(&self, kind: MediaKind, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_of(kind, name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))
    }

    async fn delete(&self, kind: MediaKind, name: &str) -> Result<()> {
        let path = self.path_of(kind, name);
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("deleting {}", path.display()))
    }

    fn list_names(&self, kind: MediaKind) -> Result<Vec<String>> {
        let dir = self.kind_dir(kind);
        let mut names = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        // Directory order is arbitrary; sort so the seeded iteration order
        // is stable across restarts.
        names.sort();
        Ok(names)
    }

    fn path_of(&self, kind: MediaKind, name: &str) -> PathBuf {
        self.kind_dir(kind).join(name)
    }
}
