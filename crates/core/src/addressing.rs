//! URL canonicalization and content-addressed cache key generation.
//!
//! Every cache and position lookup is keyed by the logical URL, the real
//! resource address independent of the scheme rewriting used for
//! interception. `cached-http`/`cached-https` spellings key identically to
//! their `http`/`https` forms.

use sha2::{Digest, Sha256};
use url::Url;

use crate::Error;

/// Interception scheme served in place of `http`.
pub const CACHED_HTTP: &str = "cached-http";
/// Interception scheme served in place of `https`.
pub const CACHED_HTTPS: &str = "cached-https";

/// Canonicalize a URL string for consistent caching.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Map an interception-scheme spelling back to its logical scheme
/// 3. Default scheme to https:// if missing
/// 4. Lowercase the host
/// 5. Remove fragment (#...)
/// 6. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<Url, Error> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".into()));
    }

    let logical = trimmed
        .strip_prefix("cached-")
        .filter(|rest| rest.starts_with("http://") || rest.starts_with("https://"))
        .unwrap_or(trimmed);

    let url_str = if logical.contains("://") { logical.to_string() } else { format!("https://{logical}") };

    let mut parsed = Url::parse(&url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    let lowered = parsed.host_str().map(|h| h.to_lowercase());
    if let Some(host) = lowered {
        parsed
            .set_host(Some(&host))
            .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Compute the cache key for a logical URL.
///
/// The input is canonicalized first, so every spelling of the same resource
/// (interception scheme, fragment variants, host case) produces the same
/// key: the SHA-256 of the canonical absolute string, as lowercase hex.
pub fn cache_key(input: &str) -> Result<String, Error> {
    let canonical = canonicalize(input)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_str().as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Rewrite a logical http(s) URL to its interception-scheme spelling.
pub fn to_interception(url: &Url) -> Result<Url, Error> {
    // Prefix swap at the string level: Url::set_scheme refuses transitions
    // between special and non-special schemes.
    let spelled = match url.scheme() {
        "http" | "https" => format!("cached-{url}"),
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    };
    Url::parse(&spelled).map_err(|e| Error::InvalidUrl(e.to_string()))
}

/// Rewrite an interception-scheme request URL back to the logical URL.
pub fn to_logical(url: &Url) -> Result<Url, Error> {
    canonicalize(url.as_str())
}
