//! offpage cache-warming entry point.
//!
//! Fetches each URL argument through the transport and writes it through
//! the content store, so a later document load starts from cache. Logging
//! goes to stderr; the key listing goes to stdout.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use offpage_core::AppConfig;
use offpage_view::CacheService;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        eprintln!("usage: offpage <url>...");
        std::process::exit(2);
    }

    let config = AppConfig::load()?;
    let service = CacheService::open(config).await?;

    let mut failed = false;
    for url in &urls {
        match service.warm(url).await {
            Ok((key, changed)) => {
                let state = if changed { "updated" } else { "unchanged" };
                println!("{key}  {state}  {url}");
            }
            Err(e) => {
                failed = true;
                tracing::error!("failed to warm {url}: {e}");
            }
        }
    }

    tracing::info!(entries = service.content().entry_count().await?, "cache warm complete");

    if failed {
        std::process::exit(1);
    }

    Ok(())
}
