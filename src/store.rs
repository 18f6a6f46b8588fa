use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::events::StoreChange;
use crate::media::MediaKind;

type ChangeHook = Box<dyn Fn(MediaKind, &[String]) + Send + Sync>;

/// Authoritative local listing of downloaded media names, one ordered set
/// per kind.
///
/// All access goes through `add`/`remove`/`list`; each kind has its own lock
/// so a reader never observes a partially-applied mutation, and image/video
/// traffic never contends. Change hooks run synchronously inside the kind's
/// critical section, which keeps notification order identical to mutation
/// order — hooks must be cheap and must not call back into the store.
pub struct MediaStore {
    shards: [Mutex<Vec<String>>; 2],
    hooks: Mutex<Vec<ChangeHook>>,
}

impl Default for MediaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaStore {
    pub fn new() -> Self {
        Self {
            shards: [Mutex::new(Vec::new()), Mutex::new(Vec::new())],
            hooks: Mutex::new(Vec::new()),
        }
    }

    fn shard(&self, kind: MediaKind) -> &Mutex<Vec<String>> {
        &self.shards[kind.index()]
    }

    /// Current names for a kind, in insertion order.
    pub fn list(&self, kind: MediaKind) -> Vec<String> {
        self.shard(kind).lock().expect("store lock poisoned").clone()
    }

    pub fn is_empty(&self) -> bool {
        MediaKind::ALL.iter().all(|kind| self.len(*kind) == 0)
    }

    pub fn len(&self, kind: MediaKind) -> usize {
        self.shard(kind).lock().expect("store lock poisoned").len()
    }

    /// Idempotent insert. Returns whether the name was actually added; a
    /// duplicate is a silent no-op and fires no notification.
    pub fn add(&self, kind: MediaKind, name: &str) -> bool {
        let mut names = self.shard(kind).lock().expect("store lock poisoned");
        if names.iter().any(|n| n == name) {
            return false;
        }
        names.push(name.to_string());
        self.notify(kind, &names);
        true
    }

    /// Removes the name if present, returning whether a removal occurred.
    pub fn remove(&self, kind: MediaKind, name: &str) -> bool {
        let mut names = self.shard(kind).lock().expect("store lock poisoned");
        let Some(pos) = names.iter().position(|n| n == name) else {
            return false;
        };
        names.remove(pos);
        self.notify(kind, &names);
        true
    }

    /// Session-start population from the local storage scan. Dedups while
    /// preserving order; fires no notifications (seeding runs before any
    /// consumer subscribes).
    pub fn seed(&self, kind: MediaKind, names: impl IntoIterator<Item = String>) {
        let mut shard = self.shard(kind).lock().expect("store lock poisoned");
        for name in names {
            if !shard.iter().any(|n| n == &name) {
                shard.push(name);
            }
        }
    }

    /// Register a hook invoked synchronously after every successful
    /// `add`/`remove` with the kind and the up-to-date full listing.
    pub fn on_change(&self, hook: impl Fn(MediaKind, &[String]) + Send + Sync + 'static) {
        self.hooks
            .lock()
            .expect("store hooks lock poisoned")
            .push(Box::new(hook));
    }

    /// Bridge change notifications onto a channel. This is the sole channel
    /// by which playback consumers learn of new or removed items.
    pub fn watch(&self) -> UnboundedReceiver<StoreChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.on_change(move |kind, names| {
            forward_change(&tx, kind, names);
        });
        rx
    }

    fn notify(&self, kind: MediaKind, names: &[String]) {
        let hooks = self.hooks.lock().expect("store hooks lock poisoned");
        for hook in hooks.iter() {
            hook(kind, names);
        }
    }
}

fn forward_change(tx: &UnboundedSender<StoreChange>, kind: MediaKind, names: &[String]) {
    // The receiver side may already be gone during shutdown.
    let _ = tx.send(StoreChange {
        kind,
        names: names.to_vec(),
    });
}
