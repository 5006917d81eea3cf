//! Rendering-surface capability set.
//!
//! The display surface is an external collaborator. The cache layer only
//! ever asks it to load a URL and to read or force its scroll offset;
//! everything the surface reports back arrives as typed [`SurfaceEvent`]s
//! on an mpsc channel wired by the embedding application.

use url::Url;

use offpage_core::Point;

/// Commands the cache layer issues to the display surface.
///
/// Implementations marshal each call onto the surface's own execution
/// context. All calls originate from the task running the document
/// loader, never from background fetch completions directly.
pub trait RenderSurface: Send + Sync + 'static {
    /// Ask the surface to load a URL (always an interception-scheme URL,
    /// so the request transits the scheme interceptor).
    fn load(&self, url: &Url);

    /// The surface's current scroll offset.
    fn scroll_offset(&self) -> Point;

    /// Force the scroll offset, never animated.
    fn set_scroll_offset(&self, offset: Point);
}

/// Notifications emitted by the display surface.
///
/// The embedding application forwards these into the loader's event
/// channel from the surface's own context; the loader consumes them in
/// arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// A navigation is about to start.
    WillStart,
    /// The surface committed new content.
    DidCommit,
    /// The surface finished loading.
    DidFinish,
    /// The scroll offset changed (user- or layout-driven).
    ScrollChanged(Point),
    /// The reader began a drag gesture.
    DragBegan,
    /// Load progress changed, 0.0 to 1.0.
    Progress(f64),
}
