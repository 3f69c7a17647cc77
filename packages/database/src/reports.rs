//! Append-only crime report storage.
//!
//! Reports are only ever inserted and read. Corrections are made by
//! submitting a new report, never by editing an old one.

use crime_portal_report_models::{CrimeReport, CrimeType, ReportFilter, fold_area};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{StoreError, escape_like, format_timestamp, limit_value, parse_timestamp};

const TABLE: &str = "crime_reports";

const COLUMNS: &str = "id, crime_type, area, location, description, reported_by, timestamp";

/// Appends a report.
///
/// Duplicate content is accepted; only a duplicate `id` is rejected.
///
/// # Errors
///
/// Returns [`StoreError::Unavailable`] if the insert fails. Nothing is
/// persisted in that case.
pub async fn insert_report(db: &dyn Database, report: &CrimeReport) -> Result<(), StoreError> {
    db.exec_raw_params(
        "INSERT INTO crime_reports
             (id, crime_type, area, area_folded, location, description, reported_by, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        &[
            DatabaseValue::String(report.id.clone()),
            DatabaseValue::String(report.crime_type.to_string()),
            DatabaseValue::String(report.area.clone()),
            DatabaseValue::String(fold_area(&report.area)),
            DatabaseValue::String(report.location.clone()),
            DatabaseValue::String(report.description.clone()),
            DatabaseValue::String(report.reported_by.clone()),
            DatabaseValue::String(format_timestamp(&report.timestamp)),
        ],
    )
    .await?;

    log::debug!("Stored report {} ({})", report.id, report.crime_type);

    Ok(())
}

/// Lists reports newest-first, applying `filter` and returning at most
/// `limit` rows.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails or a row cannot be decoded.
pub async fn list_reports(
    db: &dyn Database,
    limit: u32,
    filter: &ReportFilter,
) -> Result<Vec<CrimeReport>, StoreError> {
    let mut frags = Vec::new();
    let mut params = Vec::new();

    if let Some(needle) = filter.area_needle() {
        frags.push("area_folded LIKE '%' || ? || '%' ESCAPE '\\'");
        params.push(DatabaseValue::String(escape_like(&needle)));
    }

    if let Some(crime_type) = filter.crime_type {
        frags.push("crime_type = ?");
        params.push(DatabaseValue::String(crime_type.to_string()));
    }

    let where_clause = if frags.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", frags.join(" AND "))
    };

    params.push(limit_value(limit));

    let rows = db
        .query_raw_params(
            &format!("SELECT {COLUMNS} FROM crime_reports{where_clause} ORDER BY seq DESC LIMIT ?"),
            &params,
        )
        .await?;

    rows.iter().map(row_to_report).collect()
}

/// Looks up a single report by id.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails or the row cannot be decoded.
pub async fn get_report(db: &dyn Database, id: &str) -> Result<Option<CrimeReport>, StoreError> {
    let rows = db
        .query_raw_params(
            &format!("SELECT {COLUMNS} FROM crime_reports WHERE id = ?"),
            &[DatabaseValue::String(id.to_string())],
        )
        .await?;

    rows.first().map(row_to_report).transpose()
}

/// Reads every report in scope, oldest-first, in a single statement.
///
/// `area` matches the stored area exactly once both are folded with
/// [`fold_area`], so case (including non-ASCII letters) and surrounding
/// whitespace are ignored. `None` reads every report.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails or a row cannot be decoded.
pub async fn scan_reports(
    db: &dyn Database,
    area: Option<&str>,
) -> Result<Vec<CrimeReport>, StoreError> {
    let rows = match area {
        Some(area) => {
            db.query_raw_params(
                &format!(
                    "SELECT {COLUMNS} FROM crime_reports
                     WHERE area_folded = ?
                     ORDER BY seq ASC"
                ),
                &[DatabaseValue::String(fold_area(area))],
            )
            .await?
        }
        None => {
            db.query_raw_params(
                &format!("SELECT {COLUMNS} FROM crime_reports ORDER BY seq ASC"),
                &[],
            )
            .await?
        }
    };

    rows.iter().map(row_to_report).collect()
}

/// Converts a database row into a [`CrimeReport`].
fn row_to_report(row: &switchy_database::Row) -> Result<CrimeReport, StoreError> {
    let crime_type_label: String = row.to_value("crime_type").unwrap_or_default();
    let crime_type: CrimeType = crime_type_label.parse().map_err(|_| StoreError::Corrupt {
        table: TABLE,
        message: format!("unknown crime_type '{crime_type_label}'"),
    })?;

    let timestamp: String = row.to_value("timestamp").unwrap_or_default();

    Ok(CrimeReport {
        id: row.to_value("id").unwrap_or_default(),
        crime_type,
        area: row.to_value("area").unwrap_or_default(),
        location: row.to_value("location").unwrap_or_default(),
        description: row.to_value("description").unwrap_or_default(),
        reported_by: row.to_value("reported_by").unwrap_or_default(),
        timestamp: parse_timestamp(TABLE, &timestamp)?,
    })
}
