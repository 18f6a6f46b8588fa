use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::events::PlaybackSignal;

/// The on-screen rendering surface the slideshow engine drives.
///
/// Video playback duration is not known up front, so `begin_video` hands the
/// surface a [`VideoTicket`]; the surface reports readiness and completion
/// through it instead of the engine polling. Calls must not block.
pub trait RenderSurface: Send + Sync {
    fn show_image(&self, path: &Path);

    fn hide_image(&self);

    fn begin_video(&self, path: &Path, ticket: VideoTicket);

    fn stop_video(&self);
}

/// Epoch-stamped handle for reporting video playback progress.
///
/// The epoch pins the ticket to the engine cycle that issued it. A ticket
/// that outlives its cycle (`stop()` bumps the epoch) still sends, but the
/// engine drops the stale signal — firing it is always safe.
#[derive(Debug, Clone)]
pub struct VideoTicket {
    epoch: u64,
    signals: UnboundedSender<PlaybackSignal>,
}

impl VideoTicket {
    pub(crate) fn new(epoch: u64, signals: UnboundedSender<PlaybackSignal>) -> Self {
        Self { epoch, signals }
    }

    /// Media is loaded and playback may start.
    pub fn ready(&self) {
        let _ = self
            .signals
            .send(PlaybackSignal::VideoReady { epoch: self.epoch });
    }

    /// Playback ran to completion.
    pub fn completed(&self) {
        let _ = self
            .signals
            .send(PlaybackSignal::VideoCompleted { epoch: self.epoch });
    }
}

/// Logging stand-in for a real rendering surface: images are log lines,
/// videos are a timer that reports ready immediately and completion after a
/// fixed simulated duration.
pub struct LogSurface {
    video_duration: Duration,
}

impl LogSurface {
    pub fn new(video_duration: Duration) -> Self {
        Self { video_duration }
    }
}

impl RenderSurface for LogSurface {
    fn show_image(&self, path: &Path) {
        info!(path = %path.display(), "displaying image");
    }

    fn hide_image(&self) {
        debug!("image hidden");
    }

    fn begin_video(&self, path: &Path, ticket: VideoTicket) {
        info!(path = %path.display(), "starting video");
        let duration = self.video_duration;
        tokio::spawn(async move {
            ticket.ready();
            sleep(duration).await;
            ticket.completed();
        });
    }

    fn stop_video(&self) {
        // Nothing to tear down; a late completion from the timer task is
        // discarded by the engine's epoch check.
        debug!("video stopped");
    }
}
