use crate::media::MediaKind;

/// Emitted by `MediaStore::watch` after every successful mutation; carries
/// the full post-mutation listing for the kind.
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub kind: MediaKind,
    pub names: Vec<String>,
}

/// Signals from the render surface back into the slideshow engine. Each
/// signal carries the epoch of the ticket that produced it; signals from a
/// superseded epoch are dropped by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    /// Media is loaded and playback may start (used to swap out the image
    /// without a blank frame).
    VideoReady { epoch: u64 },
    /// Playback ran to completion.
    VideoCompleted { epoch: u64 },
}

/// External control of the slideshow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Stop,
}
