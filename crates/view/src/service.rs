//! Cache service composition root.
//!
//! One explicitly constructed instance owns the content store, the
//! position store, and the transport; the embedding application passes it
//! to every component that needs them. There is no implicit global state.

use std::sync::Arc;

use offpage_client::{FetchConfig, HttpTransport, Transport};
use offpage_core::{AppConfig, ContentStore, Error, PositionDb, addressing};

use crate::interceptor::SchemeInterceptor;
use crate::orchestrator::DocumentLoader;
use crate::surface::RenderSurface;

/// The cache service: stores plus transport, built once at startup.
pub struct CacheService {
    config: AppConfig,
    content: ContentStore,
    positions: PositionDb,
    transport: Arc<dyn Transport>,
}

impl CacheService {
    /// Build the service from configuration: open both stores and
    /// construct the HTTP transport.
    pub async fn open(config: AppConfig) -> Result<Self, Error> {
        let content = ContentStore::open(&config.cache_dir).await?;
        let positions = PositionDb::open(&config.positions_db).await?;
        let transport = HttpTransport::new(FetchConfig {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            max_redirects: config.max_redirects,
        })?;
        Ok(Self { config, content, positions, transport: Arc::new(transport) })
    }

    /// Assemble the service from already-built parts. Used by embedders
    /// that supply their own transport, and by tests.
    pub fn from_parts(
        config: AppConfig, content: ContentStore, positions: PositionDb, transport: Arc<dyn Transport>,
    ) -> Self {
        Self { config, content, positions, transport }
    }

    /// A scheme handler for the interception schemes, to be installed on
    /// the display surface's URL-scheme facility.
    pub fn interceptor(&self) -> SchemeInterceptor {
        SchemeInterceptor::new(self.content.clone(), self.transport.clone())
    }

    /// A loader driving one document view for the given logical URL.
    pub fn loader<S: RenderSurface>(&self, surface: Arc<S>, url: &str) -> Result<DocumentLoader<S>, Error> {
        DocumentLoader::new(
            surface,
            self.content.clone(),
            self.positions.clone(),
            self.transport.clone(),
            url,
            self.config.settle(),
        )
    }

    /// Fetch a URL through the transport and write it through the cache.
    ///
    /// Returns the cache key and whether the stored bytes changed.
    pub async fn warm(&self, url: &str) -> Result<(String, bool), Error> {
        let logical = addressing::canonicalize(url)?;
        let key = addressing::cache_key(logical.as_str())?;
        let bytes = self.transport.fetch(&logical).await?;
        let changed = self.content.put_if_changed(&key, bytes).await?;
        tracing::debug!("warmed {} (changed: {changed})", logical);
        Ok((key, changed))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn positions(&self) -> &PositionDb {
        &self.positions
    }
}
