//! Unified error types for offpage.
//!
//! Every failure below the load orchestrator is absorbed at the component
//! boundary that detects it: cache read errors degrade to a miss, write
//! errors are logged and skipped, fetch errors become a synthesized error
//! response for the requesting task.

use tokio_rusqlite::rusqlite;

/// Unified error types for the offpage cache service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed URL, no cache key can be derived.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Content store read/write failure.
    #[error("STORAGE_ERROR: {0}")]
    Storage(String),

    /// Position database operation failed.
    #[error("POSITION_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("POSITION_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// HTTP error response or network failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("INVALID_URL"));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_storage_error_display() {
        let err = Error::Storage("disk full".to_string());
        assert!(err.to_string().contains("STORAGE_ERROR"));
        assert!(err.to_string().contains("disk full"));
    }
}
