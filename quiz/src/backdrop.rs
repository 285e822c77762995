//! Asynchronous backdrop loading with a single fallback to the default image.
//!
//! Loads run off the render thread and report back over a channel; `poll` drains it once per
//! frame. Each load carries a ticket so a reply for a superseded request is dropped.

use std::path::PathBuf;
use std::sync::Arc;

use engine::image::{ImageError, RgbaImage};
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

pub const DEFAULT_BACKDROP: &str = "assets/images/all.png";

#[derive(Debug)]
pub struct LoadReply {
    pub ticket: u64,
    pub id: String,
    pub result: Result<RgbaImage, ImageError>,
}

/// Starts a load for `id` and eventually sends exactly one `LoadReply` on `reply`.
pub trait ImageLoader {
    fn load(&self, id: &str, ticket: u64, reply: UnboundedSender<LoadReply>);
}

#[derive(Debug, Clone)]
pub enum BackdropStatus {
    Idle,
    Loading { id: String, fallback: bool },
    Loaded { id: String, image: Arc<RgbaImage>, generation: u64 },
    Failed { id: String },
}

pub struct BackdropResolver<L: ImageLoader> {
    loader: L,
    default_id: String,
    requested: Option<String>,
    status: BackdropStatus,
    ticket: u64,
    tx: UnboundedSender<LoadReply>,
    rx: UnboundedReceiver<LoadReply>,
}

impl<L: ImageLoader> BackdropResolver<L> {
    pub fn new(loader: L, default_id: impl Into<String>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            loader,
            default_id: default_id.into(),
            requested: None,
            status: BackdropStatus::Idle,
            ticket: 0,
            tx,
            rx,
        }
    }

    pub fn status(&self) -> &BackdropStatus {
        &self.status
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Loaded image plus a generation number that changes with every successful load.
    pub fn image(&self) -> Option<(&Arc<RgbaImage>, u64)> {
        match &self.status {
            BackdropStatus::Loaded {
                image, generation, ..
            } => Some((image, *generation)),
            _ => None,
        }
    }

    /// Forgets the current request. Replies still in flight are dropped when they arrive.
    pub fn reset(&mut self) {
        if self.requested.is_none() && matches!(self.status, BackdropStatus::Idle) {
            return;
        }
        self.ticket += 1;
        self.requested = None;
        self.status = BackdropStatus::Idle;
    }

    /// Asks for `id` (blank means the default). Repeating the current request is a no-op.
    pub fn request(&mut self, id: &str) {
        let id = match id.trim() {
            "" => self.default_id.clone(),
            id => id.to_string(),
        };
        if self.requested.as_deref() == Some(id.as_str()) {
            return;
        }
        self.requested = Some(id.clone());
        self.start(id, false);
    }

    fn start(&mut self, id: String, fallback: bool) {
        self.ticket += 1;
        tracing::debug!(%id, ticket = self.ticket, fallback, "loading backdrop");
        self.loader.load(&id, self.ticket, self.tx.clone());
        self.status = BackdropStatus::Loading { id, fallback };
    }

    /// Applies every completed load. Never blocks.
    pub fn poll(&mut self) {
        loop {
            let reply = match self.rx.try_recv() {
                Ok(reply) => reply,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            self.apply(reply);
        }
    }

    fn apply(&mut self, reply: LoadReply) {
        if reply.ticket != self.ticket {
            tracing::debug!(id = %reply.id, ticket = reply.ticket, "dropping stale backdrop load");
            return;
        }
        let fallback = matches!(self.status, BackdropStatus::Loading { fallback: true, .. });
        match reply.result {
            Ok(image) => {
                self.status = BackdropStatus::Loaded {
                    id: reply.id,
                    image: Arc::new(image),
                    generation: reply.ticket,
                };
            }
            Err(err) if !fallback && reply.id != self.default_id => {
                tracing::warn!(id = %reply.id, "backdrop failed, falling back to default: {err}");
                let default_id = self.default_id.clone();
                self.start(default_id, true);
            }
            Err(err) => {
                tracing::warn!(id = %reply.id, "backdrop unavailable: {err}");
                self.status = BackdropStatus::Failed { id: reply.id };
            }
        }
    }
}

/// Decodes PNGs from disk on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    root: PathBuf,
    handle: Handle,
}

impl FileImageLoader {
    pub fn new(root: impl Into<PathBuf>, handle: Handle) -> Self {
        Self {
            root: root.into(),
            handle,
        }
    }
}

impl ImageLoader for FileImageLoader {
    fn load(&self, id: &str, ticket: u64, reply: UnboundedSender<LoadReply>) {
        let path = self.root.join(id);
        let id = id.to_string();
        self.handle.spawn_blocking(move || {
            let result = RgbaImage::open_png(&path);
            let _ = reply.send(LoadReply { ticket, id, result });
        });
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use manual::ManualLoader;

#[cfg(any(test, feature = "test-support"))]
mod manual {
    use std::cell::RefCell;
    use std::rc::Rc;

    use engine::image::{ImageError, RgbaImage};
    use tokio::sync::mpsc::UnboundedSender;

    use super::{ImageLoader, LoadReply};

    /// A loader whose requests stay outstanding until the test completes them.
    #[derive(Debug, Clone, Default)]
    pub struct ManualLoader {
        pending: Rc<RefCell<Vec<(String, u64, UnboundedSender<LoadReply>)>>>,
    }

    impl ManualLoader {
        pub fn new() -> Self {
            Self::default()
        }

        /// Ids requested so far and still waiting, oldest first.
        pub fn pending_ids(&self) -> Vec<String> {
            self.pending.borrow().iter().map(|(id, _, _)| id.clone()).collect()
        }

        /// Completes the oldest outstanding request for `id`. Returns false if there was none.
        pub fn complete(&self, id: &str, result: Result<RgbaImage, ImageError>) -> bool {
            let mut pending = self.pending.borrow_mut();
            let Some(pos) = pending.iter().position(|(pid, _, _)| pid == id) else {
                return false;
            };
            let (id, ticket, reply) = pending.remove(pos);
            let _ = reply.send(LoadReply { ticket, id, result });
            true
        }
    }

    impl ImageLoader for ManualLoader {
        fn load(&self, id: &str, ticket: u64, reply: UnboundedSender<LoadReply>) {
            self.pending.borrow_mut().push((id.to_string(), ticket, reply));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> RgbaImage {
        RgbaImage::filled(4, 4, [1, 2, 3, 255])
    }

    #[test]
    fn blank_request_uses_default() {
        let loader = ManualLoader::new();
        let mut r = BackdropResolver::new(loader.clone(), DEFAULT_BACKDROP);
        r.request("  ");
        assert_eq!(loader.pending_ids(), vec![DEFAULT_BACKDROP.to_string()]);
        assert!(matches!(r.status(), BackdropStatus::Loading { fallback: false, .. }));
    }

    #[test]
    fn repeating_the_same_request_does_not_reload() {
        let loader = ManualLoader::new();
        let mut r = BackdropResolver::new(loader.clone(), DEFAULT_BACKDROP);
        r.request("a.png");
        r.request("a.png");
        assert_eq!(loader.pending_ids().len(), 1);
    }

    #[test]
    fn success_moves_to_loaded() {
        let loader = ManualLoader::new();
        let mut r = BackdropResolver::new(loader.clone(), DEFAULT_BACKDROP);
        r.request("a.png");
        assert!(r.image().is_none());
        assert!(loader.complete("a.png", Ok(image())));
        r.poll();
        let (img, _) = r.image().expect("loaded");
        assert_eq!(img.width(), 4);
    }

    #[test]
    fn failure_retries_default_once_then_gives_up() {
        let loader = ManualLoader::new();
        let mut r = BackdropResolver::new(loader.clone(), DEFAULT_BACKDROP);
        r.request("missing.png");
        loader.complete("missing.png", Err(ImageError::Empty));
        r.poll();
        assert!(matches!(r.status(), BackdropStatus::Loading { fallback: true, .. }));
        assert_eq!(loader.pending_ids(), vec![DEFAULT_BACKDROP.to_string()]);

        loader.complete(DEFAULT_BACKDROP, Err(ImageError::Empty));
        r.poll();
        assert!(matches!(r.status(), BackdropStatus::Failed { .. }));
        assert!(loader.pending_ids().is_empty(), "no further retries");
    }

    #[test]
    fn default_failure_does_not_retry() {
        let loader = ManualLoader::new();
        let mut r = BackdropResolver::new(loader.clone(), DEFAULT_BACKDROP);
        r.request("");
        loader.complete(DEFAULT_BACKDROP, Err(ImageError::Empty));
        r.poll();
        assert!(matches!(r.status(), BackdropStatus::Failed { .. }));
        assert!(loader.pending_ids().is_empty());
    }

    #[test]
    fn reset_returns_to_idle_and_ignores_late_reply() {
        let loader = ManualLoader::new();
        let mut r = BackdropResolver::new(loader.clone(), DEFAULT_BACKDROP);
        r.request("a.png");
        r.reset();
        loader.complete("a.png", Ok(image()));
        r.poll();
        assert!(matches!(r.status(), BackdropStatus::Idle));

        r.request("a.png");
        assert_eq!(loader.pending_ids(), vec!["a.png".to_string()]);
    }

    #[test]
    fn superseded_reply_is_dropped() {
        let loader = ManualLoader::new();
        let mut r = BackdropResolver::new(loader.clone(), DEFAULT_BACKDROP);
        r.request("a.png");
        r.request("b.png");
        loader.complete("a.png", Ok(image()));
        r.poll();
        assert!(matches!(r.status(), BackdropStatus::Loading { id, .. } if id == "b.png"));

        loader.complete("b.png", Ok(image()));
        r.poll();
        assert!(matches!(r.status(), BackdropStatus::Loaded { id, .. } if id == "b.png"));
    }
}
