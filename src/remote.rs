use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::media::MediaKind;

/// Errors at the remote catalog boundary.
///
/// `Unavailable` covers transient transport and server failures; the core
/// never retries inside a pass — the next scheduled snapshot fetch is the
/// retry.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("remote item not found: {0}")]
    NotFound(String),

    #[error("remote catalog unavailable")]
    Unavailable(#[source] anyhow::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// A remote folder handle resolved by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderRef {
    pub id: String,
    pub name: String,
}

/// A file as listed by the remote source. `id` addresses the bytes, `name`
/// is the identity used for reconciliation against the local store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

/// Point-in-time remote listing for both kinds. Transient — consumed by one
/// reconciliation pass and dropped.
#[derive(Debug, Clone, Default)]
pub struct RemoteSnapshot {
    pub images: Vec<RemoteFile>,
    pub videos: Vec<RemoteFile>,
}

impl RemoteSnapshot {
    pub fn files(&self, kind: MediaKind) -> &[RemoteFile] {
        match kind {
            MediaKind::Image => &self.images,
            MediaKind::Video => &self.videos,
        }
    }
}

/// The remote file source. Authentication, listing, and byte download live
/// behind this trait; the reconciliation core only ever sees names, ids, and
/// bytes.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Resolve a folder by its display name. `Ok(None)` means the folder
    /// does not exist (distinct from the catalog being unreachable).
    async fn find_folder(&self, name: &str) -> CatalogResult<Option<FolderRef>>;

    /// List the files of one kind inside a folder.
    async fn list_files(
        &self,
        folder: &FolderRef,
        kind: MediaKind,
    ) -> CatalogResult<Vec<RemoteFile>>;

    /// Look up a single file in a folder by exact name.
    async fn find_file(&self, folder: &FolderRef, name: &str) -> CatalogResult<Option<RemoteFile>>;

    /// Fetch the byte content of a file.
    async fn download(&self, file: &RemoteFile) -> CatalogResult<Bytes>;
}

/// Fetch a full snapshot of a folder, both kinds listed concurrently.
pub async fn snapshot<C>(catalog: &C, folder: &FolderRef) -> CatalogResult<RemoteSnapshot>
where
    C: RemoteCatalog + ?Sized,
{
    let (images, videos) = tokio::join!(
        catalog.list_files(folder, MediaKind::Image),
        catalog.list_files(folder, MediaKind::Video),
    );
    Ok(RemoteSnapshot {
        images: images?,
        videos: videos?,
    })
}
