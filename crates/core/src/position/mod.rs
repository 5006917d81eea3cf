//! Persistent scroll positions, keyed by logical URL.
//!
//! Positions live in a lightweight SQLite key-value layer separate from the
//! content files, under key `"scroll_" + cache_key(url)`. Each position is
//! stored as two explicit REAL columns, not an opaque archived structure.

pub mod connection;
pub mod migrations;

use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};
use url::Url;

use crate::Error;
use crate::addressing::cache_key;

pub use connection::PositionDb;

/// A 2D scroll offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

fn position_key(url: &Url) -> Result<String, Error> {
    Ok(format!("scroll_{}", cache_key(url.as_str())?))
}

impl PositionDb {
    /// Save the scroll position for a logical URL.
    ///
    /// Upserts: created on the first capture, updated on every subsequent
    /// one.
    pub async fn save(&self, url: &Url, position: Point) -> Result<(), Error> {
        let key = position_key(url)?;
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO positions (key, x, y, updated_at) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(key) DO UPDATE SET
                        x = excluded.x,
                        y = excluded.y,
                        updated_at = excluded.updated_at",
                    params![key, position.x, position.y, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Load the scroll position for a logical URL.
    ///
    /// Returns (0, 0) when no position has been saved.
    pub async fn load(&self, url: &Url) -> Result<Point, Error> {
        let key = position_key(url)?;
        self.conn
            .call(move |conn| -> Result<Point, Error> {
                let mut stmt = conn.prepare("SELECT x, y FROM positions WHERE key = ?1")?;

                let result = stmt.query_row(params![key], |row| Ok(Point { x: row.get(0)?, y: row.get(1)? }));

                match result {
                    Ok(point) => Ok(point),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(Point::default()),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}
