//! Custom-scheme request interceptor.
//!
//! Every resource load the display surface issues transits this
//! interceptor, because the surface is only ever given
//! `cached-http`/`cached-https` URLs. That makes the cache authoritative
//! and transparent to the renderer: cached bytes are served without
//! touching the network, and a miss is fetched once and written through.

use std::sync::Arc;

use bytes::Bytes;
use url::Url;

use offpage_client::Transport;
use offpage_core::{ContentStore, addressing};

use crate::task::{InterceptedTask, LoadFailure, ResponseMeta, TaskId, TaskRegistry};

/// Scheme handler for the interception schemes.
///
/// Implements the {start, stop} capability set the surface's URL-scheme
/// facility requires. `stop` only unregisters: an in-flight fetch is left
/// to complete (its delivery is suppressed by the registry gate), which
/// keeps cancellation cheap without leaking resources.
#[derive(Clone)]
pub struct SchemeInterceptor {
    content: ContentStore,
    transport: Arc<dyn Transport>,
    registry: Arc<TaskRegistry>,
}

impl SchemeInterceptor {
    pub fn new(content: ContentStore, transport: Arc<dyn Transport>) -> Self {
        Self { content, transport, registry: Arc::new(TaskRegistry::new()) }
    }

    /// The registry tracking this interceptor's in-flight tasks.
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Begin serving a synthetic request.
    ///
    /// Registers the task, then resolves it asynchronously: cache hit →
    /// deliver stored bytes; miss → fetch, write through, deliver; fetch
    /// failure → deliver a synthesized 500-class error.
    pub fn start(&self, task: Arc<dyn InterceptedTask>) {
        let id = task.id();
        let request_url = task.request_url();
        self.registry.register(id, task);

        let this = self.clone();
        tokio::spawn(async move {
            this.serve(id, request_url).await;
        });
    }

    /// Stop serving a synthetic request.
    ///
    /// Unregisters the task; any in-flight fetch completes but delivers
    /// nothing.
    pub fn stop(&self, task: &dyn InterceptedTask) {
        self.registry.cancel(task.id());
    }

    async fn serve(&self, id: TaskId, request_url: Url) {
        let logical = match addressing::to_logical(&request_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("unresolvable request URL {request_url}: {e}");
                self.deliver_failure(id, &LoadFailure::resource_failed());
                return;
            }
        };

        let key = match addressing::cache_key(logical.as_str()) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("no cache key for {logical}: {e}");
                self.deliver_failure(id, &LoadFailure::resource_failed());
                return;
            }
        };

        match self.content.get(&key).await {
            Ok(Some(bytes)) => {
                tracing::debug!("cache hit for {}", logical);
                self.deliver(id, &logical, bytes);
                return;
            }
            Ok(None) => tracing::debug!("cache miss for {}", logical),
            // a read failure degrades to a miss
            Err(e) => tracing::warn!("cache read failed for {}: {e}", logical),
        }

        match self.transport.fetch(&logical).await {
            Ok(bytes) => {
                if let Err(e) = self.content.put(&key, bytes.clone()).await {
                    tracing::warn!("cache write failed for {}: {e}", logical);
                }
                self.deliver(id, &logical, bytes);
            }
            Err(e) => {
                tracing::debug!("fetch failed for {}: {e}", logical);
                self.deliver_failure(id, &LoadFailure::resource_failed());
            }
        }
    }

    /// Three-step delivery, re-checking `is_active` immediately before
    /// each step: cancellation races the completion callback, and a task
    /// stopped mid-delivery must be silently abandoned.
    fn deliver(&self, id: TaskId, url: &Url, bytes: Bytes) {
        let Some(task) = self.registry.active(id) else {
            return;
        };

        let meta = ResponseMeta::html(url.clone(), bytes.len() as u64);
        task.receive_response(&meta);

        if !self.registry.is_active(id) {
            return;
        }
        task.receive_data(bytes);

        if !self.registry.is_active(id) {
            return;
        }
        task.finish();

        self.registry.complete(id);
    }

    fn deliver_failure(&self, id: TaskId, failure: &LoadFailure) {
        let Some(task) = self.registry.active(id) else {
            return;
        };
        task.fail(failure);
        self.registry.complete(id);
    }
}
