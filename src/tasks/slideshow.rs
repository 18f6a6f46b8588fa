use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cursor::PlaybackCursor;
use crate::events::{EngineCommand, PlaybackSignal, StoreChange};
use crate::media::{MediaItem, MediaKind};
use crate::settings::AppSettings;
use crate::storage::LocalStorage;
use crate::store::MediaStore;
use crate::surface::{RenderSurface, VideoTicket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No item on screen. Terminal after `stop()`; quiescent while started
    /// but out of displayable items.
    Idle,
    /// An image is up; wake at `until`.
    ShowingImage { until: Instant },
    /// A video ticket is out; waiting for ready/completed signals.
    ShowingVideo,
}

/// The playback state machine.
///
/// One cycle alternates an image phase (fixed wall-clock duration) and a
/// video phase (runs until the surface reports completion), looping
/// indefinitely. Item lists are re-read through the cursors, which are
/// rebuilt from store change notifications — a file deleted mid-playback is
/// never re-selected, and a fresh download becomes eligible on the next pick
/// without restarting the engine.
///
/// Every cycle-changing action bumps `epoch`; video tickets carry the epoch
/// they were issued under, so a completion signal arriving after `stop()`
/// (or after a restart) is recognized as stale and dropped.
pub struct SlideshowEngine {
    store: Arc<MediaStore>,
    storage: Arc<dyn LocalStorage>,
    surface: Arc<dyn RenderSurface>,
    settings: AppSettings,
    images: PlaybackCursor,
    videos: PlaybackCursor,
    phase: Phase,
    /// The item currently on screen, if any.
    current: Option<MediaItem>,
    running: bool,
    epoch: u64,
    signal_tx: UnboundedSender<PlaybackSignal>,
}

impl SlideshowEngine {
    pub fn new(
        store: Arc<MediaStore>,
        storage: Arc<dyn LocalStorage>,
        surface: Arc<dyn RenderSurface>,
        settings: AppSettings,
        signal_tx: UnboundedSender<PlaybackSignal>,
    ) -> Self {
        Self {
            store,
            storage,
            surface,
            settings,
            images: PlaybackCursor::new(),
            videos: PlaybackCursor::new(),
            phase: Phase::Idle,
            current: None,
            running: false,
            epoch: 0,
            signal_tx,
        }
    }

    /// Begin (or restart) the slideshow cycle.
    pub fn start(&mut self) {
        self.epoch += 1;
        self.running = true;
        // Cursor refresh at cycle start covers changes that happened while
        // stopped, when no notification consumer was driving rebuilds.
        self.images.rebuild(self.store.list(MediaKind::Image));
        self.videos.rebuild(self.store.list(MediaKind::Video));
        info!(
            images = self.images.len(),
            videos = self.videos.len(),
            "slideshow started"
        );
        self.advance(false);
    }

    /// Halt playback from any state. Stale video completions arriving after
    /// this are dropped by the epoch check.
    pub fn stop(&mut self) {
        self.epoch += 1;
        match self.phase {
            Phase::ShowingImage { .. } => self.surface.hide_image(),
            Phase::ShowingVideo => {
                self.surface.stop_video();
                self.surface.hide_image();
            }
            Phase::Idle => {}
        }
        self.phase = Phase::Idle;
        self.current = None;
        self.running = false;
        info!("slideshow stopped");
    }

    /// The pending image deadline, if any, for the driver's timer arm.
    fn image_deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::ShowingImage { until } => Some(until),
            _ => None,
        }
    }

    /// Image timer elapsed: move on to the video phase. The image stays on
    /// screen until the video reports ready (or is hidden immediately when
    /// no video follows).
    fn on_image_elapsed(&mut self) {
        if !matches!(self.phase, Phase::ShowingImage { .. }) {
            return;
        }
        self.enter_video_phase(true);
    }

    fn handle_signal(&mut self, signal: PlaybackSignal) {
        match signal {
            PlaybackSignal::VideoReady { epoch } => {
                if epoch != self.epoch {
                    debug!(epoch, current = self.epoch, "dropping stale video-ready signal");
                    return;
                }
                if matches!(self.phase, Phase::ShowingVideo) {
                    // Playback is rolling; now the image can go without
                    // leaving a blank frame.
                    self.surface.hide_image();
                }
            }
            PlaybackSignal::VideoCompleted { epoch } => {
                if epoch != self.epoch {
                    debug!(epoch, current = self.epoch, "dropping stale video-completed signal");
                    return;
                }
                if matches!(self.phase, Phase::ShowingVideo) {
                    self.advance(false);
                }
            }
        }
    }

    /// A store change for one kind: rebuild that cursor so the next pick
    /// walks the new list from its start. The item currently on screen is
    /// never interrupted; a quiescent engine re-enters the cycle if items
    /// appeared.
    fn on_store_change(&mut self, change: StoreChange) {
        debug!(kind = %change.kind, items = change.names.len(), "media set changed");
        if let Some(current) = &self.current {
            if current.kind == change.kind && !change.names.iter().any(|n| n == &current.name) {
                // Playback of the current item finishes normally; the
                // rebuilt cursor just never selects it again.
                debug!(name = %current.name, "item on screen left the media set");
            }
        }
        match change.kind {
            MediaKind::Image => self.images.rebuild(change.names),
            MediaKind::Video => self.videos.rebuild(change.names),
        }
        if self.running && self.phase == Phase::Idle {
            self.advance(false);
        }
    }

    /// Enter the next displayable phase: image first when enabled and
    /// available, else video, else quiescent.
    fn advance(&mut self, image_on_screen: bool) {
        if !self.running {
            return;
        }
        if self.settings.display_images {
            if let Some(name) = self.images.next() {
                let path = self.storage.path_of(MediaKind::Image, &name);
                self.surface.show_image(&path);
                self.phase = Phase::ShowingImage {
                    until: Instant::now() + self.settings.image_duration(),
                };
                self.current = Some(MediaItem::new(MediaKind::Image, name));
                return;
            }
        }
        self.enter_video_phase(image_on_screen);
    }

    fn enter_video_phase(&mut self, image_on_screen: bool) {
        if self.settings.display_videos {
            if let Some(name) = self.videos.next() {
                let path = self.storage.path_of(MediaKind::Video, &name);
                let ticket = VideoTicket::new(self.epoch, self.signal_tx.clone());
                self.surface.begin_video(&path, ticket);
                self.phase = Phase::ShowingVideo;
                self.current = Some(MediaItem::new(MediaKind::Video, name));
                return;
            }
        }
        // No video to play; the image (if any) comes down now.
        if image_on_screen {
            self.surface.hide_image();
        }
        if self.settings.display_images && !self.images.is_empty() {
            self.advance(false);
        } else {
            if self.phase != Phase::Idle {
                debug!("no displayable media; slideshow idle");
            }
            self.phase = Phase::Idle;
            self.current = None;
        }
    }
}

/// Async driver: owns the engine and multiplexes commands, playback
/// signals, store changes, and the image timer.
pub async fn run(
    mut engine: SlideshowEngine,
    mut commands: Receiver<EngineCommand>,
    mut signals: UnboundedReceiver<PlaybackSignal>,
    mut changes: UnboundedReceiver<StoreChange>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        let deadline = engine.image_deadline();
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting slideshow task");
                engine.stop();
                break;
            }

            // Image phase pacing; armed only while an image is up.
            _ = async { sleep_until(deadline.unwrap_or_else(Instant::now)).await },
                if deadline.is_some() =>
            {
                engine.on_image_elapsed();
            }

            maybe_cmd = commands.recv() => {
                match maybe_cmd {
                    Some(EngineCommand::Start) => engine.start(),
                    Some(EngineCommand::Stop) => engine.stop(),
                    None => {
                        warn!("engine command channel closed");
                        engine.stop();
                        break;
                    }
                }
            }

            Some(signal) = signals.recv() => {
                engine.handle_signal(signal);
            }

            maybe_change = changes.recv() => {
                match maybe_change {
                    Some(change) => engine.on_store_change(change),
                    None => {
                        // Store dropped; keep cycling over the lists we have.
                        debug!("store change channel closed");
                    }
                }
            }
        }
    }
    Ok(())
}
