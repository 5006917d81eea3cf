//! Intercepted tasks and the registry that tracks them.
//!
//! Every synthetic request the display surface issues for an
//! interception-scheme URL is correlated to one opaque [`TaskId`]. The
//! registry owns the id-to-handle mapping: an entry is removed on
//! completion, error, or cancellation, whichever occurs first, and all
//! later events for a removed identity are no-ops.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use url::Url;

/// Opaque identity of one in-flight synthetic request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// Synthesized response metadata for a cached document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMeta {
    /// The request URL the response answers.
    pub url: Url,
    /// HTTP status semantics (always 200 for served content).
    pub status: u16,
    /// MIME type; this cache understands exactly one content type.
    pub mime_type: &'static str,
    /// Character set of the body.
    pub charset: &'static str,
    /// Body length in bytes.
    pub content_length: u64,
}

impl ResponseMeta {
    /// Response metadata for a UTF-8 HTML document of the given length.
    pub fn html(url: Url, content_length: u64) -> Self {
        Self { url, status: 200, mime_type: "text/html", charset: "utf-8", content_length }
    }
}

/// Synthesized load failure delivered when neither cache nor network can
/// answer.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub code: i32,
    pub message: String,
}

impl LoadFailure {
    /// The generic failure delivered for any unfulfillable load.
    pub fn resource_failed() -> Self {
        Self { code: 500, message: "failed to load resource".to_string() }
    }
}

/// Handle to one synthetic request issued by the display surface.
///
/// Delivery is a three-step sequence (response, data, finish) or a single
/// `fail`. Implementations marshal each call onto the surface's own
/// execution context; calls arrive from the interceptor's background
/// completion tasks.
pub trait InterceptedTask: Send + Sync + 'static {
    /// The opaque identity correlating this request in the registry.
    fn id(&self) -> TaskId;

    /// The interception-scheme URL the surface requested.
    fn request_url(&self) -> Url;

    /// Response headers arrived.
    fn receive_response(&self, meta: &ResponseMeta);

    /// A chunk of body bytes arrived.
    fn receive_data(&self, chunk: Bytes);

    /// The response is complete.
    fn finish(&self);

    /// The load failed; no response will follow.
    fn fail(&self, failure: &LoadFailure);
}

/// Registry of in-flight synthetic requests.
///
/// A single mutex serializes register / is_active / complete / cancel, so
/// a presence check is atomic with respect to removal. That atomicity is
/// what keeps a delivery from reaching a task the surface already
/// stopped: the interceptor re-checks `is_active` immediately before each
/// delivery step. The lock is never held across a delivery call or disk
/// I/O.
#[derive(Default)]
pub struct TaskRegistry {
    inner: Mutex<HashMap<TaskId, Arc<dyn InterceptedTask>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, Arc<dyn InterceptedTask>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a task handle, replacing any stale entry with the same id.
    pub fn register(&self, id: TaskId, handle: Arc<dyn InterceptedTask>) {
        self.lock().insert(id, handle);
    }

    /// Whether the id still maps to a live task.
    pub fn is_active(&self, id: TaskId) -> bool {
        self.lock().contains_key(&id)
    }

    /// The live handle for an id, if any.
    pub fn active(&self, id: TaskId) -> Option<Arc<dyn InterceptedTask>> {
        self.lock().get(&id).cloned()
    }

    /// Remove a completed task. Removing an absent id is a no-op.
    pub fn complete(&self, id: TaskId) {
        self.lock().remove(&id);
    }

    /// Remove a cancelled task. Removing an absent id is a no-op.
    pub fn cancel(&self, id: TaskId) {
        self.lock().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SpyTask;

    fn spy(id: u64) -> Arc<dyn InterceptedTask> {
        Arc::new(SpyTask::new(TaskId(id), "cached-https://example.com/doc"))
    }

    #[test]
    fn test_register_and_is_active() {
        let registry = TaskRegistry::new();
        registry.register(TaskId(1), spy(1));

        assert!(registry.is_active(TaskId(1)));
        assert!(!registry.is_active(TaskId(2)));
    }

    #[test]
    fn test_complete_removes() {
        let registry = TaskRegistry::new();
        registry.register(TaskId(1), spy(1));

        registry.complete(TaskId(1));
        assert!(!registry.is_active(TaskId(1)));
        assert!(registry.active(TaskId(1)).is_none());
    }

    #[test]
    fn test_cancel_idempotent() {
        let registry = TaskRegistry::new();
        registry.register(TaskId(7), spy(7));

        registry.cancel(TaskId(7));
        registry.cancel(TaskId(7));
        registry.complete(TaskId(7));
        assert!(!registry.is_active(TaskId(7)));
    }

    #[test]
    fn test_register_overwrites_stale_entry() {
        let registry = TaskRegistry::new();
        registry.register(TaskId(3), spy(3));
        registry.register(TaskId(3), spy(3));

        assert!(registry.is_active(TaskId(3)));
        registry.complete(TaskId(3));
        assert!(!registry.is_active(TaskId(3)));
    }

    #[test]
    fn test_response_meta_html() {
        let meta = ResponseMeta::html(Url::parse("cached-https://example.com/").unwrap(), 42);
        assert_eq!(meta.status, 200);
        assert_eq!(meta.mime_type, "text/html");
        assert_eq!(meta.charset, "utf-8");
        assert_eq!(meta.content_length, 42);
    }

    #[test]
    fn test_load_failure_code() {
        let failure = LoadFailure::resource_failed();
        assert_eq!(failure.code, 500);
        assert!(failure.message.contains("failed to load"));
    }
}
