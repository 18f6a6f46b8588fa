use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::media::MediaKind;
use crate::remote::{RemoteCatalog, RemoteFile, RemoteSnapshot};
use crate::storage::LocalStorage;
use crate::store::MediaStore;

/// Outcome of one per-kind reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindReport {
    pub kind: MediaKind,
    pub downloaded: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl KindReport {
    fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            downloaded: 0,
            deleted: 0,
            failed: 0,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.downloaded == 0 && self.deleted == 0 && self.failed == 0
    }
}

/// Outcome of a full snapshot reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileReport {
    pub images: KindReport,
    pub videos: KindReport,
}

/// Keeps the local media set converged on the remote listing: downloads
/// what is remote-only, deletes what is local-only, and publishes every
/// membership change through the store.
///
/// The store is only ever touched after the corresponding storage operation
/// succeeds, so the listing always reflects what is actually on disk.
pub struct Reconciler {
    catalog: Arc<dyn RemoteCatalog>,
    storage: Arc<dyn LocalStorage>,
    store: Arc<MediaStore>,
    // One pass lock per kind: repeated reconcile calls for the same kind
    // serialize, while image and video passes run concurrently.
    passes: [Mutex<()>; 2],
}

impl Reconciler {
    pub fn new(
        catalog: Arc<dyn RemoteCatalog>,
        storage: Arc<dyn LocalStorage>,
        store: Arc<MediaStore>,
    ) -> Self {
        Self {
            catalog,
            storage,
            store,
            passes: [Mutex::new(()), Mutex::new(())],
        }
    }

    pub fn catalog(&self) -> &Arc<dyn RemoteCatalog> {
        &self.catalog
    }

    /// Reconcile both kinds against a snapshot. The two kind passes run
    /// concurrently with each other; failures are counted and logged, never
    /// propagated.
    pub async fn reconcile(&self, snapshot: &RemoteSnapshot) -> ReconcileReport {
        let (images, videos) = tokio::join!(
            self.reconcile_kind(MediaKind::Image, &snapshot.images),
            self.reconcile_kind(MediaKind::Video, &snapshot.videos),
        );
        ReconcileReport { images, videos }
    }

    /// Reconcile one kind against its remote listing.
    pub async fn reconcile_kind(&self, kind: MediaKind, remote: &[RemoteFile]) -> KindReport {
        let _pass = self.passes[kind.index()].lock().await;

        let local = self.store.list(kind);
        let local_names: HashSet<&str> = local.iter().map(String::as_str).collect();
        let remote_names: HashSet<&str> = remote.iter().map(|f| f.name.as_str()).collect();

        let mut report = KindReport::new(kind);

        for file in remote.iter().filter(|f| !local_names.contains(f.name.as_str())) {
            match self.download_one(kind, file).await {
                Ok(()) => report.downloaded += 1,
                Err(()) => report.failed += 1,
            }
        }

        for name in local.iter().filter(|n| !remote_names.contains(n.as_str())) {
            match self.storage.delete(kind, name).await {
                Ok(()) => {
                    self.store.remove(kind, name);
                    debug!(%kind, %name, "deleted local file absent from remote");
                    report.deleted += 1;
                }
                Err(err) => {
                    // Keep the listing entry; dropping it after a failed
                    // delete would leave the file on disk but invisible.
                    warn!(%kind, %name, "local delete failed: {err:#}");
                    report.failed += 1;
                }
            }
        }

        if report.is_noop() {
            debug!(%kind, local = local.len(), "media set already converged");
        } else {
            info!(
                %kind,
                downloaded = report.downloaded,
                deleted = report.deleted,
                failed = report.failed,
                "reconciliation pass complete"
            );
        }
        report
    }

    async fn download_one(&self, kind: MediaKind, file: &RemoteFile) -> Result<(), ()> {
        let bytes = match self.catalog.download(file).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%kind, name = %file.name, "download failed: {err:#}");
                return Err(());
            }
        };
        match self.storage.write(kind, &file.name, &bytes).await {
            Ok(()) => {
                self.store.add(kind, &file.name);
                debug!(%kind, name = %file.name, size = bytes.len(), "downloaded remote file");
                Ok(())
            }
            Err(err) => {
                // Not added: a store entry without bytes on disk would be a
                // phantom the slideshow tries to display.
                warn!(%kind, name = %file.name, "persisting download failed: {err:#}");
                Err(())
            }
        }
    }
}

/// Periodic sync task: every `interval`, resolve the remote folder and run a
/// reconciliation pass per kind. Remote failures abandon the affected kind
/// for the cycle and are retried on the next tick; nothing here is fatal and
/// nothing may stall the playback loop.
pub async fn run(
    reconciler: Arc<Reconciler>,
    folder_name: String,
    interval: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        sync_once(&reconciler, &folder_name).await;

        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting sync task");
                break;
            }
            _ = sleep(interval) => {}
        }
    }
    Ok(())
}

async fn sync_once(reconciler: &Reconciler, folder_name: &str) {
    let folder = match reconciler.catalog().find_folder(folder_name).await {
        Ok(Some(folder)) => folder,
        Ok(None) => {
            warn!(folder = folder_name, "remote folder not found; retrying next pass");
            return;
        }
        Err(err) => {
            warn!(folder = folder_name, "remote catalog unavailable: {err:#}");
            return;
        }
    };

    for kind in MediaKind::ALL {
        match reconciler.catalog().list_files(&folder, *kind).await {
            Ok(files) => {
                reconciler.reconcile_kind(*kind, &files).await;
            }
            Err(err) => {
                // Abandon only this kind for the cycle; the other kind's
                // pass still runs.
                warn!(kind = %kind, "remote listing failed: {err:#}");
            }
        }
    }
}
