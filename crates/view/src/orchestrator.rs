//! Document load orchestration.
//!
//! Drives one logical document through its life cycle: resolve the saved
//! scroll position, display from cache through the interceptor, refresh
//! in the background, and hand scroll tracking back to the reader, all
//! without the reader's position ever visibly moving.
//!
//! Phases per document view:
//!
//! ```text
//! Init -> Loading(locked) -> Settling -> Live(tracking)
//! ```
//!
//! While the lock is held, every scroll/commit/progress notification is
//! answered by forcing the offset back to the restore target, overriding
//! the transient auto-scrolls the surface performs while laying out. A
//! refresh-triggered reload never re-asserts the lock; it captures and
//! reapplies the current offset directly.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use url::Url;

use offpage_client::Transport;
use offpage_core::{ContentStore, Error, Point, PositionDb, addressing};

use crate::surface::{RenderSurface, SurfaceEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Init,
    Loading,
    Settling,
    Live,
}

/// Orchestrates the load/refresh/restore cycle for one document view.
pub struct DocumentLoader<S: RenderSurface> {
    surface: Arc<S>,
    content: ContentStore,
    positions: PositionDb,
    transport: Arc<dyn Transport>,
    url: Url,
    display_url: Url,
    settle: Duration,
    phase: Phase,
    target: Point,
    /// Offset captured around a refresh-triggered reload, reapplied until
    /// that reload finishes.
    preserve: Option<Point>,
}

impl<S: RenderSurface> DocumentLoader<S> {
    pub(crate) fn new(
        surface: Arc<S>,
        content: ContentStore,
        positions: PositionDb,
        transport: Arc<dyn Transport>,
        url: &str,
        settle: Duration,
    ) -> Result<Self, Error> {
        let url = addressing::canonicalize(url)?;
        let display_url = addressing::to_interception(&url)?;
        Ok(Self {
            surface,
            content,
            positions,
            transport,
            url,
            display_url,
            settle,
            phase: Phase::Init,
            target: Point::default(),
            preserve: None,
        })
    }

    /// The logical URL this loader drives.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Drive the document until the event channel closes (teardown), then
    /// persist the final scroll offset.
    pub async fn run(mut self, mut events: mpsc::Receiver<SurfaceEvent>) {
        debug_assert_eq!(self.phase, Phase::Init);

        self.target = match self.positions.load(&self.url).await {
            Ok(point) => point,
            Err(e) => {
                tracing::warn!("position load failed for {}: {e}", self.url);
                Point::default()
            }
        };

        self.surface.load(&self.display_url);
        self.phase = Phase::Loading;
        tracing::debug!("loading {} with restore target ({}, {})", self.url, self.target.x, self.target.y);

        // One background refresh per document-load cycle, fetched directly
        // rather than through the interceptor.
        let (refresh_tx, mut refresh_rx) = oneshot::channel();
        {
            let transport = self.transport.clone();
            let content = self.content.clone();
            let url = self.url.clone();
            tokio::spawn(async move {
                let _ = refresh_tx.send(refresh(transport.as_ref(), &content, &url).await);
            });
        }
        let mut refresh_pending = true;

        let mut settle_deadline: Option<Instant> = None;

        loop {
            let deadline = settle_deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(60));
            tokio::select! {
                maybe = events.recv() => {
                    match maybe {
                        Some(event) => self.on_event(event, &mut settle_deadline).await,
                        None => break,
                    }
                }
                _ = tokio::time::sleep_until(deadline), if settle_deadline.is_some() => {
                    settle_deadline = None;
                    self.release_lock();
                }
                changed = &mut refresh_rx, if refresh_pending => {
                    refresh_pending = false;
                    if matches!(changed, Ok(true)) {
                        self.reload_preserving_offset();
                    }
                }
            }
        }

        // teardown: one final capture of wherever the reader ended up
        let offset = self.surface.scroll_offset();
        if let Err(e) = self.positions.save(&self.url, offset).await {
            tracing::warn!("final position save failed for {}: {e}", self.url);
        }
    }

    fn lock_held(&self) -> bool {
        matches!(self.phase, Phase::Loading | Phase::Settling)
    }

    async fn on_event(&mut self, event: SurfaceEvent, settle_deadline: &mut Option<Instant>) {
        match event {
            SurfaceEvent::WillStart => {
                tracing::trace!("navigation starting for {}", self.url);
            }
            SurfaceEvent::DidCommit => {
                if let Some(offset) = self.preserve {
                    self.surface.set_scroll_offset(offset);
                } else if self.lock_held() {
                    self.surface.set_scroll_offset(self.target);
                }
            }
            SurfaceEvent::DidFinish => {
                if let Some(offset) = self.preserve.take() {
                    self.surface.set_scroll_offset(offset);
                } else if self.phase == Phase::Loading {
                    self.phase = Phase::Settling;
                    *settle_deadline = Some(Instant::now() + self.settle);
                }
            }
            SurfaceEvent::ScrollChanged(offset) => {
                if self.lock_held() {
                    self.surface.set_scroll_offset(self.target);
                } else if self.phase == Phase::Live {
                    if let Err(e) = self.positions.save(&self.url, offset).await {
                        tracing::warn!("position save failed for {}: {e}", self.url);
                    }
                }
            }
            SurfaceEvent::DragBegan => {
                // the reader's gesture wins over the restore target
                if self.lock_held() {
                    *settle_deadline = None;
                    self.phase = Phase::Live;
                    tracing::debug!("reader drag released position lock for {}", self.url);
                }
            }
            SurfaceEvent::Progress(_) => {
                if self.lock_held() {
                    self.surface.set_scroll_offset(self.target);
                }
            }
        }
    }

    /// End of the settle window: one final authoritative scroll to the
    /// restore target, then live tracking.
    fn release_lock(&mut self) {
        if self.phase != Phase::Settling {
            return;
        }
        self.surface.set_scroll_offset(self.target);
        self.phase = Phase::Live;
        tracing::debug!("position lock released for {}", self.url);
    }

    /// A refresh found new content: reload the display URL with the
    /// current offset captured before and reapplied after the call, so
    /// the update never visibly moves the reader.
    fn reload_preserving_offset(&mut self) {
        let offset = self.surface.scroll_offset();
        self.surface.load(&self.display_url);
        self.surface.set_scroll_offset(offset);
        if !self.lock_held() {
            // the surface replaces content asynchronously; keep reapplying
            // through the reload's commit/finish
            self.preserve = Some(offset);
        }
        tracing::debug!("content changed, reloaded {}", self.url);
    }
}

/// Background refresh: fetch the logical URL directly and write through
/// only when the bytes differ. Failures are silent no-ops; the cached
/// copy keeps serving until the next load cycle.
async fn refresh(transport: &dyn Transport, content: &ContentStore, url: &Url) -> bool {
    let bytes = match transport.fetch(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("background refresh failed for {url}: {e}");
            return false;
        }
    };

    let key = match addressing::cache_key(url.as_str()) {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!("no cache key for {url}: {e}");
            return false;
        }
    };

    match content.put_if_changed(&key, bytes).await {
        Ok(changed) => changed,
        Err(e) => {
            tracing::warn!("background refresh could not store {url}: {e}");
            false
        }
    }
}
