//! Integration tests for the slideshow task: the engine driven through its
//! command/signal/change channels, with a scripted render surface.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use driftframe::events::EngineCommand;
use driftframe::media::MediaKind;
use driftframe::settings::AppSettings;
use driftframe::storage::LocalStorage;
use driftframe::store::MediaStore;
use driftframe::surface::{RenderSurface, VideoTicket};
use driftframe::tasks::slideshow::{self, SlideshowEngine};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SurfaceCall {
    ShowImage(PathBuf),
    HideImage,
    BeginVideo(PathBuf),
    StopVideo,
}

/// Surface that streams every call to the test and either auto-plays videos
/// (ready immediately, completed shortly after) or parks the ticket for the
/// test to fire manually.
struct ScriptedSurface {
    calls: mpsc::UnboundedSender<SurfaceCall>,
    auto_play: bool,
    parked_tickets: Mutex<Vec<VideoTicket>>,
}

impl ScriptedSurface {
    fn new(auto_play: bool) -> (Arc<Self>, mpsc::UnboundedReceiver<SurfaceCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                calls: tx,
                auto_play,
                parked_tickets: Mutex::new(Vec::new()),
            }),
            rx,
        )
    }

    fn parked_ticket(&self) -> VideoTicket {
        self.parked_tickets
            .lock()
            .unwrap()
            .pop()
            .expect("a parked video ticket")
    }
}

impl RenderSurface for ScriptedSurface {
    fn show_image(&self, path: &Path) {
        let _ = self.calls.send(SurfaceCall::ShowImage(path.to_path_buf()));
    }

    fn hide_image(&self) {
        let _ = self.calls.send(SurfaceCall::HideImage);
    }

    fn begin_video(&self, path: &Path, ticket: VideoTicket) {
        let _ = self.calls.send(SurfaceCall::BeginVideo(path.to_path_buf()));
        if self.auto_play {
            tokio::spawn(async move {
                ticket.ready();
                tokio::time::sleep(Duration::from_millis(20)).await;
                ticket.completed();
            });
        } else {
            self.parked_tickets.lock().unwrap().push(ticket);
        }
    }

    fn stop_video(&self) {
        let _ = self.calls.send(SurfaceCall::StopVideo);
    }
}

struct NullStorage;

#[async_trait]
impl LocalStorage for NullStorage {
    async fn write(&self, _kind: MediaKind, _name: &str, _bytes: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _kind: MediaKind, _name: &str) -> Result<()> {
        Ok(())
    }

    fn list_names(&self, _kind: MediaKind) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn path_of(&self, kind: MediaKind, name: &str) -> PathBuf {
        PathBuf::from(kind.subdir()).join(name)
    }
}

struct Rig {
    store: Arc<MediaStore>,
    surface: Arc<ScriptedSurface>,
    calls: mpsc::UnboundedReceiver<SurfaceCall>,
    commands: mpsc::Sender<EngineCommand>,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<Result<()>>,
}

fn rig(settings: AppSettings, auto_play: bool) -> Rig {
    let store = Arc::new(MediaStore::new());
    let (surface, calls) = ScriptedSurface::new(auto_play);
    let (command_tx, command_rx) = mpsc::channel(16);
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    let change_rx = store.watch();
    let cancel = CancellationToken::new();

    let engine = SlideshowEngine::new(
        Arc::clone(&store),
        Arc::new(NullStorage),
        Arc::clone(&surface) as Arc<dyn RenderSurface>,
        settings,
        signal_tx,
    );
    let task = tokio::spawn(slideshow::run(
        engine,
        command_rx,
        signal_rx,
        change_rx,
        cancel.clone(),
    ));

    Rig {
        store,
        surface,
        calls,
        commands: command_tx,
        cancel,
        task,
    }
}

async fn expect_call(rig: &mut Rig) -> SurfaceCall {
    timeout(Duration::from_secs(2), rig.calls.recv())
        .await
        .expect("surface call within deadline")
        .expect("surface channel open")
}

async fn expect_quiet(rig: &mut Rig) {
    let stray = timeout(Duration::from_millis(200), rig.calls.recv()).await;
    assert!(stray.is_err(), "unexpected surface call: {:?}", stray);
}

fn short_image_settings() -> AppSettings {
    AppSettings {
        image_duration_ms: 50,
        ..AppSettings::default()
    }
}

async fn shutdown(rig: Rig) {
    rig.cancel.cancel();
    let _ = rig.task.await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cycles_image_then_video_then_image() {
    let mut rig = rig(short_image_settings(), true);
    rig.store.seed(MediaKind::Image, ["a.jpg".to_string()]);
    rig.store.seed(MediaKind::Video, ["clip.mp4".to_string()]);

    rig.commands.send(EngineCommand::Start).await.unwrap();

    assert_eq!(
        expect_call(&mut rig).await,
        SurfaceCall::ShowImage(PathBuf::from("images/a.jpg"))
    );
    // Image timer elapses, video phase begins while the image is still up.
    assert_eq!(
        expect_call(&mut rig).await,
        SurfaceCall::BeginVideo(PathBuf::from("videos/clip.mp4"))
    );
    // Video reported ready: now the image comes down.
    assert_eq!(expect_call(&mut rig).await, SurfaceCall::HideImage);
    // Completion restarts the cycle with the (single) image again.
    assert_eq!(
        expect_call(&mut rig).await,
        SurfaceCall::ShowImage(PathBuf::from("images/a.jpg"))
    );

    shutdown(rig).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn videos_only_never_touches_the_image_surface() {
    let settings = AppSettings {
        display_images: false,
        ..AppSettings::default()
    };
    let mut rig = rig(settings, false);
    rig.store.seed(MediaKind::Image, ["ignored.jpg".to_string()]);
    rig.store.seed(MediaKind::Video, ["clip.mp4".to_string()]);

    rig.commands.send(EngineCommand::Start).await.unwrap();

    assert_eq!(
        expect_call(&mut rig).await,
        SurfaceCall::BeginVideo(PathBuf::from("videos/clip.mp4"))
    );
    expect_quiet(&mut rig).await;

    shutdown(rig).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_then_stale_completion_stays_idle() {
    let settings = AppSettings {
        display_images: false,
        ..AppSettings::default()
    };
    let mut rig = rig(settings, false);
    rig.store.seed(MediaKind::Video, ["clip.mp4".to_string()]);

    rig.commands.send(EngineCommand::Start).await.unwrap();
    assert_eq!(
        expect_call(&mut rig).await,
        SurfaceCall::BeginVideo(PathBuf::from("videos/clip.mp4"))
    );
    let stale = rig.surface.parked_ticket();

    rig.commands.send(EngineCommand::Stop).await.unwrap();
    assert_eq!(expect_call(&mut rig).await, SurfaceCall::StopVideo);
    assert_eq!(expect_call(&mut rig).await, SurfaceCall::HideImage);

    // The surface fires the dead ticket; the engine must not re-enter
    // playback.
    stale.completed();
    expect_quiet(&mut rig).await;

    shutdown(rig).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fresh_download_wakes_an_idle_slideshow() {
    let mut rig = rig(short_image_settings(), true);

    rig.commands.send(EngineCommand::Start).await.unwrap();
    // Nothing to display yet.
    expect_quiet(&mut rig).await;

    // A reconciliation pass lands a new image; the change notification is
    // the only wake-up signal.
    rig.store.add(MediaKind::Image, "fresh.jpg");

    assert_eq!(
        expect_call(&mut rig).await,
        SurfaceCall::ShowImage(PathBuf::from("images/fresh.jpg"))
    );

    shutdown(rig).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn removed_item_is_not_reselected_on_the_next_pass() {
    let settings = AppSettings {
        display_videos: false,
        image_duration_ms: 200,
        ..AppSettings::default()
    };
    let mut rig = rig(settings, false);
    rig.store.seed(
        MediaKind::Image,
        ["a.jpg".to_string(), "b.jpg".to_string()],
    );

    rig.commands.send(EngineCommand::Start).await.unwrap();
    assert_eq!(
        expect_call(&mut rig).await,
        SurfaceCall::ShowImage(PathBuf::from("images/a.jpg"))
    );

    // a.jpg disappears from the store while it is on screen; the rebuilt
    // cursor restarts from the new list head.
    rig.store.remove(MediaKind::Image, "a.jpg");

    assert_eq!(expect_call(&mut rig).await, SurfaceCall::HideImage);
    assert_eq!(
        expect_call(&mut rig).await,
        SurfaceCall::ShowImage(PathBuf::from("images/b.jpg"))
    );

    shutdown(rig).await;
}
