//! Binary entrypoint for driftframe.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use driftframe::config::Configuration;
use driftframe::events::{EngineCommand, PlaybackSignal};
use driftframe::http_catalog::HttpCatalog;
use driftframe::media::MediaKind;
use driftframe::remote::{self, RemoteCatalog};
use driftframe::settings::{self, AppSettings};
use driftframe::storage::{DiskStorage, LocalStorage};
use driftframe::store::MediaStore;
use driftframe::surface::LogSurface;
use driftframe::tasks::slideshow::{self, SlideshowEngine};
use driftframe::tasks::sync::{self, Reconciler};

#[derive(Debug, Parser)]
#[command(name = "driftframe", version, about = "ambient media frame")]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Run a single reconciliation pass, print the report, and exit
    #[arg(long = "sync-once")]
    sync_once: bool,

    /// Override the per-image display duration (ms)
    #[arg(long = "image-duration-ms", value_name = "MILLIS")]
    image_duration_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // init tracing (RUST_LOG controls level, default = info)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let Args {
        config,
        sync_once,
        image_duration_ms,
    } = Args::parse();

    let cfg = Configuration::from_yaml_file(&config)
        .with_context(|| format!("failed to load configuration from {}", config.display()))?
        .validated()
        .context("invalid configuration values")?;
    tracing::info!(
        library = %cfg.library_path.display(),
        folder = %cfg.remote.folder,
        sync_interval = %humantime::format_duration(cfg.sync_interval),
        "loaded configuration"
    );

    let storage: Arc<dyn LocalStorage> = Arc::new(
        DiskStorage::new(&cfg.library_path).context("initializing local media storage")?,
    );
    let catalog: Arc<dyn RemoteCatalog> = Arc::new(HttpCatalog::new(
        cfg.remote.base_url.clone(),
        cfg.remote.token.clone(),
    ));

    // Seed the store from what is already on disk.
    let store = Arc::new(MediaStore::new());
    for kind in MediaKind::ALL {
        let names = storage
            .list_names(*kind)
            .with_context(|| format!("scanning local {kind} library"))?;
        store.seed(*kind, names);
    }
    tracing::info!(
        images = store.len(MediaKind::Image),
        videos = store.len(MediaKind::Video),
        "seeded local media listing"
    );
    if store.is_empty() {
        tracing::info!("no local media yet; slideshow idles until the first sync lands");
    }

    let reconciler = Arc::new(Reconciler::new(
        Arc::clone(&catalog),
        Arc::clone(&storage),
        Arc::clone(&store),
    ));

    if sync_once {
        return run_sync_once(&reconciler, &cfg.remote.folder).await;
    }

    // Settings are fetched at most once per session; absence means defaults.
    let mut app_settings = match catalog.find_folder(&cfg.remote.folder).await {
        Ok(Some(folder)) => settings::fetch(catalog.as_ref(), &folder)
            .await
            .unwrap_or_default(),
        Ok(None) => {
            tracing::warn!(folder = %cfg.remote.folder, "remote folder not found; using default settings");
            AppSettings::default()
        }
        Err(err) => {
            tracing::warn!("settings fetch skipped, remote unavailable: {err:#}");
            AppSettings::default()
        }
    };
    if let Some(ms) = image_duration_ms {
        app_settings.image_duration_ms = ms;
    }
    tracing::info!(?app_settings, "slideshow settings resolved");

    // Channels (small/bounded where commands flow, unbounded for notifications)
    let (command_tx, command_rx) = mpsc::channel::<EngineCommand>(16); // External -> Engine
    let (signal_tx, signal_rx) = mpsc::unbounded_channel::<PlaybackSignal>(); // Surface -> Engine
    let change_rx = store.watch(); // Store -> Engine

    let surface = Arc::new(LogSurface::new(cfg.simulated_video_duration));
    let engine = SlideshowEngine::new(
        Arc::clone(&store),
        Arc::clone(&storage),
        surface,
        app_settings,
        signal_tx,
    );

    let cancel = CancellationToken::new();

    // Ctrl-C cancels the pipeline
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    let mut tasks = JoinSet::new();

    // Sync
    tasks.spawn({
        let reconciler = Arc::clone(&reconciler);
        let folder = cfg.remote.folder.clone();
        let interval = cfg.sync_interval;
        let cancel = cancel.clone();
        async move {
            sync::run(reconciler, folder, interval, cancel)
                .await
                .context("sync task failed")
        }
    });

    // Slideshow
    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            slideshow::run(engine, command_rx, signal_rx, change_rx, cancel)
                .await
                .context("slideshow task failed")
        }
    });

    command_tx
        .send(EngineCommand::Start)
        .await
        .context("failed to start slideshow engine")?;

    // Drain JoinSet (wait for tasks to complete after cancellation)
    while let Some(res) = tasks.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}

async fn run_sync_once(reconciler: &Reconciler, folder_name: &str) -> Result<()> {
    let folder = reconciler
        .catalog()
        .find_folder(folder_name)
        .await
        .context("resolving remote folder")?
        .with_context(|| format!("remote folder {folder_name:?} not found"))?;

    let snapshot = remote::snapshot(reconciler.catalog().as_ref(), &folder)
        .await
        .context("fetching remote snapshot")?;
    let report = reconciler.reconcile(&snapshot).await;

    for kind_report in [report.images, report.videos] {
        println!(
            "{}: {} downloaded, {} deleted, {} failed",
            kind_report.kind, kind_report.downloaded, kind_report.deleted, kind_report.failed
        );
    }
    Ok(())
}
