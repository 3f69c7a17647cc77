#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Durable storage for crime reports and generated predictions.
//!
//! Both collections live in a single `SQLite` file accessed through
//! `switchy_database`. Reports are append-only: this crate exposes no
//! update or delete for them. Each report and prediction is written with a
//! single `INSERT`, so a reader either sees the whole row or nothing.
//!
//! Every table carries an `INTEGER PRIMARY KEY AUTOINCREMENT` sequence
//! column; newest-first listings order by it rather than by timestamp so
//! that two rows created in the same microsecond still list in insertion
//! order.
//!
//! Area matching never relies on `SQLite`'s `LIKE` or `NOCASE`, which only
//! fold ASCII letters. Each row stores an `area_folded` column computed
//! with [`fold_area`] at insert time, and queries compare it against a
//! needle folded the same way.

pub mod predictions;
pub mod reports;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use crime_portal_report_models::fold_area;
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};
use switchy_database_connection::init_sqlite_rusqlite;
use thiserror::Error;

/// Default path for the portal database, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/portal.db";

/// Errors from report and prediction storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened, read, or written. Retryable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be decoded.
    #[error("Corrupt row in {table}: {message}")]
    Corrupt {
        /// Table the row came from.
        table: &'static str,
        /// What could not be decoded.
        message: String,
    },

    /// An I/O operation failed (e.g. creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization of a stored column failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<switchy_database::DatabaseError> for StoreError {
    fn from(e: switchy_database::DatabaseError) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// Opens (or creates) the portal `SQLite` database at `path` and ensures
/// the schema exists.
///
/// # Errors
///
/// Returns [`StoreError`] if the parent directory cannot be created, the
/// database cannot be opened, or schema creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, StoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    log::debug!("Opening portal database at {}", path.display());
    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| StoreError::Unavailable(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;

    Ok(db)
}

/// Creates all tables and indexes if they don't already exist.
async fn ensure_schema(db: &dyn Database) -> Result<(), StoreError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS crime_reports (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            id          TEXT NOT NULL UNIQUE,
            crime_type  TEXT NOT NULL,
            area        TEXT NOT NULL,
            area_folded TEXT NOT NULL,
            location    TEXT NOT NULL,
            description TEXT NOT NULL,
            reported_by TEXT NOT NULL,
            timestamp   TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS predictions (
            seq             INTEGER PRIMARY KEY AUTOINCREMENT,
            id              TEXT NOT NULL UNIQUE,
            area            TEXT,
            area_folded     TEXT,
            insights        TEXT NOT NULL,
            confidence      TEXT NOT NULL,
            prediction_text TEXT NOT NULL,
            timestamp       TEXT NOT NULL
        )",
    )
    .await?;

    ensure_area_folded(db, "crime_reports").await?;
    ensure_area_folded(db, "predictions").await?;

    db.exec_raw(
        "CREATE INDEX IF NOT EXISTS idx_crime_reports_area_folded
         ON crime_reports (area_folded)",
    )
    .await?;

    Ok(())
}

/// Adds and backfills `area_folded` on databases created before the column
/// existed. Only the derived column is written; stored reports keep their
/// original fields.
async fn ensure_area_folded(db: &dyn Database, table: &'static str) -> Result<(), StoreError> {
    let columns = db
        .query_raw_params(&format!("PRAGMA table_info({table})"), &[])
        .await?;
    let present = columns.iter().any(|column| {
        let name: String = column.to_value("name").unwrap_or_default();
        name == "area_folded"
    });
    if present {
        return Ok(());
    }

    db.exec_raw(&format!("ALTER TABLE {table} ADD COLUMN area_folded TEXT"))
        .await?;

    let rows = db
        .query_raw_params(
            &format!("SELECT seq, area FROM {table} WHERE area IS NOT NULL"),
            &[],
        )
        .await?;

    for row in &rows {
        let seq: i64 = row.to_value("seq").map_err(|e| StoreError::Corrupt {
            table,
            message: format!("invalid seq: {e}"),
        })?;
        let area: String = row.to_value("area").unwrap_or_default();
        db.exec_raw_params(
            &format!("UPDATE {table} SET area_folded = ? WHERE seq = ?"),
            &[
                DatabaseValue::String(fold_area(&area)),
                DatabaseValue::Int64(seq),
            ],
        )
        .await?;
    }

    log::info!("Backfilled area_folded for {} row(s) in {table}", rows.len());

    Ok(())
}

/// Formats a timestamp the way it is stored: RFC 3339, UTC, microseconds.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp column.
fn parse_timestamp(table: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            table,
            message: format!("invalid timestamp '{value}': {e}"),
        })
}

/// Escapes `LIKE` wildcards so `needle` matches literally under
/// `ESCAPE '\'`.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Converts a caller-supplied limit to a bindable value.
fn limit_value(limit: u32) -> DatabaseValue {
    DatabaseValue::Int64(i64::from(limit))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use switchy_database::Database;

    /// Opens a fresh database file under the system temp directory.
    pub async fn temp_db(tag: &str) -> (Box<dyn Database>, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "crime_portal_database_{tag}_{}.db",
            uuid::Uuid::new_v4()
        ));
        let db = super::open_db(&path).await.unwrap();
        (db, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_wildcards() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
        assert_eq!(escape_like("Downtown"), "Downtown");
    }

    #[test]
    fn timestamps_round_trip_at_microsecond_precision() {
        let ts = DateTime::parse_from_rfc3339("2025-03-01T12:30:45.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        let stored = format_timestamp(&ts);
        assert_eq!(stored, "2025-03-01T12:30:45.123456Z");
        assert_eq!(parse_timestamp("crime_reports", &stored).unwrap(), ts);
        assert!(parse_timestamp("crime_reports", "yesterday").is_err());
    }

    #[tokio::test]
    async fn open_db_backfills_folded_areas_on_older_files() {
        let path = std::env::temp_dir().join(format!(
            "crime_portal_database_backfill_{}.db",
            uuid::Uuid::new_v4()
        ));
        {
            let old = init_sqlite_rusqlite(Some(path.as_path())).unwrap();
            old.exec_raw(
                "CREATE TABLE crime_reports (
                    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
                    id          TEXT NOT NULL UNIQUE,
                    crime_type  TEXT NOT NULL,
                    area        TEXT NOT NULL,
                    location    TEXT NOT NULL,
                    description TEXT NOT NULL,
                    reported_by TEXT NOT NULL,
                    timestamp   TEXT NOT NULL
                )",
            )
            .await
            .unwrap();
            old.exec_raw(
                "INSERT INTO crime_reports
                     (id, crime_type, area, location, description, reported_by, timestamp)
                 VALUES ('old', 'Theft', 'Östermalm', 'Karlavägen', 'Bike stolen',
                         'Anonymous', '2025-01-01T00:00:00.000000Z')",
            )
            .await
            .unwrap();
        }

        let db = open_db(&path).await.unwrap();
        let scoped = reports::scan_reports(db.as_ref(), Some("ÖSTERMALM"))
            .await
            .unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].area, "Östermalm");

        drop(db);
        let reopened = open_db(&path).await.unwrap();
        assert_eq!(
            reports::scan_reports(reopened.as_ref(), Some("östermalm"))
                .await
                .unwrap()
                .len(),
            1
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn open_db_is_idempotent() {
        let (db, path) = test_support::temp_db("reopen").await;
        drop(db);
        let reopened = open_db(&path).await.unwrap();
        let rows = reopened
            .query_raw_params("SELECT COUNT(*) AS cnt FROM crime_reports", &[])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        let _ = std::fs::remove_file(&path);
    }
}
