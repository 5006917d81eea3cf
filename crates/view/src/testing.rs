//! Shared test doubles: spy surface, spy task, scripted transport.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use offpage_client::Transport;
use offpage_core::{Error, Point, addressing};

use crate::surface::RenderSurface;
use crate::task::{InterceptedTask, LoadFailure, ResponseMeta, TaskId};

/// Rendering-surface stand-in that records every command it receives.
#[derive(Default)]
pub(crate) struct SpySurface {
    loads: Mutex<Vec<Url>>,
    offset: Mutex<Point>,
    offsets_set: Mutex<Vec<Point>>,
}

impl SpySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loads(&self) -> Vec<Url> {
        self.loads.lock().unwrap().clone()
    }

    pub fn offset(&self) -> Point {
        *self.offset.lock().unwrap()
    }

    /// Simulate the reader (or the renderer's layout) moving the view.
    pub fn set_offset(&self, offset: Point) {
        *self.offset.lock().unwrap() = offset;
    }

    pub fn offsets_set(&self) -> Vec<Point> {
        self.offsets_set.lock().unwrap().clone()
    }
}

impl RenderSurface for SpySurface {
    fn load(&self, url: &Url) {
        self.loads.lock().unwrap().push(url.clone());
    }

    fn scroll_offset(&self) -> Point {
        *self.offset.lock().unwrap()
    }

    fn set_scroll_offset(&self, offset: Point) {
        *self.offset.lock().unwrap() = offset;
        self.offsets_set.lock().unwrap().push(offset);
    }
}

/// Intercepted-task stand-in counting every delivery it receives.
pub(crate) struct SpyTask {
    id: TaskId,
    url: Url,
    responses: Mutex<Vec<ResponseMeta>>,
    chunks: Mutex<Vec<Bytes>>,
    finishes: AtomicUsize,
    failures: Mutex<Vec<LoadFailure>>,
}

impl SpyTask {
    pub fn new(id: TaskId, url: &str) -> Self {
        Self {
            id,
            url: Url::parse(url).unwrap(),
            responses: Mutex::new(Vec::new()),
            chunks: Mutex::new(Vec::new()),
            finishes: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
        }
    }

    pub fn responses(&self) -> Vec<ResponseMeta> {
        self.responses.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<Bytes> {
        self.chunks.lock().unwrap().clone()
    }

    pub fn finish_count(&self) -> usize {
        self.finishes.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> Vec<LoadFailure> {
        self.failures.lock().unwrap().clone()
    }

    /// Total deliveries of any kind; zero for a task stopped in time.
    pub fn delivery_count(&self) -> usize {
        self.responses.lock().unwrap().len()
            + self.chunks.lock().unwrap().len()
            + self.finish_count()
            + self.failures.lock().unwrap().len()
    }

    /// Poll until the task reaches a terminal outcome or the timeout
    /// elapses.
    pub async fn wait_terminal(&self, timeout: Duration) {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.finish_count() == 0 && self.failures.lock().unwrap().is_empty() {
            if tokio::time::Instant::now() >= deadline {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl InterceptedTask for SpyTask {
    fn id(&self) -> TaskId {
        self.id
    }

    fn request_url(&self) -> Url {
        self.url.clone()
    }

    fn receive_response(&self, meta: &ResponseMeta) {
        self.responses.lock().unwrap().push(meta.clone());
    }

    fn receive_data(&self, chunk: Bytes) {
        self.chunks.lock().unwrap().push(chunk);
    }

    fn finish(&self) {
        self.finishes.fetch_add(1, Ordering::SeqCst);
    }

    fn fail(&self, failure: &LoadFailure) {
        self.failures.lock().unwrap().push(failure.clone());
    }
}

/// Transport fake serving scripted responses per canonical URL.
#[derive(Default)]
pub(crate) struct FakeTransport {
    delay: Mutex<Duration>,
    responses: Mutex<HashMap<String, VecDeque<Result<Bytes, String>>>>,
    fetches: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        let transport = Self::default();
        *transport.delay.lock().unwrap() = delay;
        transport
    }

    /// Delay every subsequent fetch, to hold a fetch in flight while the
    /// test races it against a stop or a scroll.
    pub fn with_fetch_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Queue the next result served for a URL (any spelling).
    pub fn script(&self, url: &str, result: Result<Bytes, &str>) {
        let canonical = addressing::canonicalize(url).unwrap();
        self.responses
            .lock()
            .unwrap()
            .entry(canonical.as_str().to_string())
            .or_default()
            .push_back(result.map_err(|msg| msg.to_string()));
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, url: &Url) -> Result<Bytes, Error> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(url.as_str())
            .and_then(|queue| queue.pop_front());

        match next {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(message)) => Err(Error::HttpError(message)),
            None => Err(Error::HttpError(format!("no scripted response for {url}"))),
        }
    }
}
