//! SQLite Recent Searches
//!
//! Implements RecentSearchStore using a local SQLite file.
//! Blocking database work runs on the blocking thread pool.

use crate::domain::entities::{RecentSearch, ResolvedLocation};
use crate::domain::errors::SearchError;
use crate::domain::ports::{RecentSearchStore, MAX_RECENT_SEARCHES};
use crate::domain::value_objects::Coordinates;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS recent_searches (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    place_formatted TEXT NOT NULL,
    longitude REAL NOT NULL,
    latitude REAL NOT NULL,
    searched_at TEXT NOT NULL,
    seq INTEGER NOT NULL
)";

/// SQLite-backed recent searches.
///
/// Ordering uses a monotonically increasing sequence number rather than
/// the timestamp, so two records within the same clock tick still keep
/// their order.
pub struct SqliteRecentSearches {
    db_path: PathBuf,
}

impl SqliteRecentSearches {
    /// Open (and create if needed) the database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let db_path = db_path.as_ref().to_path_buf();
        let conn = Connection::open(&db_path)?;
        conn.execute(SCHEMA, [])?;
        Ok(Self { db_path })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, SearchError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, SearchError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&db_path)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| SearchError::Storage(format!("spawn_blocking error: {}", e)))?
    }

    fn row_to_recent(row: &Row) -> rusqlite::Result<RecentSearch> {
        let searched_at: String = row.get(5)?;
        let searched_at = DateTime::parse_from_rfc3339(&searched_at)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(RecentSearch {
            id: row.get(0)?,
            name: row.get(1)?,
            place_formatted: row.get(2)?,
            coordinates: Coordinates::new(row.get(3)?, row.get(4)?),
            searched_at,
        })
    }
}

#[async_trait]
impl RecentSearchStore for SqliteRecentSearches {
    async fn record(&self, location: &ResolvedLocation) -> Result<(), SearchError> {
        let entry = RecentSearch::new(location);

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let next_seq: i64 =
                tx.query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM recent_searches", [], |r| {
                    r.get(0)
                })?;

            tx.execute(
                "INSERT OR REPLACE INTO recent_searches
                 (id, name, place_formatted, longitude, latitude, searched_at, seq)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.id,
                    entry.name,
                    entry.place_formatted,
                    entry.coordinates.longitude,
                    entry.coordinates.latitude,
                    entry.searched_at.to_rfc3339(),
                    next_seq,
                ],
            )?;

            tx.execute(
                "DELETE FROM recent_searches WHERE id NOT IN
                 (SELECT id FROM recent_searches ORDER BY seq DESC LIMIT ?1)",
                params![MAX_RECENT_SEARCHES as i64],
            )?;

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn list(&self) -> Result<Vec<RecentSearch>, SearchError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, place_formatted, longitude, latitude, searched_at
                 FROM recent_searches ORDER BY seq DESC LIMIT ?1",
            )?;

            let rows = stmt
                .query_map(params![MAX_RECENT_SEARCHES as i64], |row| {
                    Self::row_to_recent(row)
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(rows)
        })
        .await
    }

    async fn clear(&self) -> Result<(), SearchError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM recent_searches", [])?;
            Ok(())
        })
        .await
    }
}
