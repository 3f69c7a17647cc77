//! Persisted prediction storage.
//!
//! Predictions are stored as generated so that listing them later returns
//! exactly what callers saw at generation time, no matter how many reports
//! have arrived since.

use crime_portal_report_models::{Confidence, Prediction, fold_area};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::{StoreError, escape_like, format_timestamp, limit_value, parse_timestamp};

const TABLE: &str = "predictions";

/// Persists a generated prediction.
///
/// # Errors
///
/// Returns [`StoreError`] if the insights cannot be serialized or the insert
/// fails.
pub async fn insert_prediction(db: &dyn Database, prediction: &Prediction) -> Result<(), StoreError> {
    let insights = serde_json::to_string(&prediction.insights)?;

    db.exec_raw_params(
        "INSERT INTO predictions
             (id, area, area_folded, insights, confidence, prediction_text, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        &[
            DatabaseValue::String(prediction.id.clone()),
            prediction
                .area
                .clone()
                .map_or(DatabaseValue::Null, DatabaseValue::String),
            prediction
                .area
                .as_deref()
                .map_or(DatabaseValue::Null, |area| DatabaseValue::String(fold_area(area))),
            DatabaseValue::String(insights),
            DatabaseValue::String(prediction.confidence.to_string()),
            DatabaseValue::String(prediction.prediction_text.clone()),
            DatabaseValue::String(format_timestamp(&prediction.timestamp)),
        ],
    )
    .await?;

    Ok(())
}

/// Lists predictions newest-first, at most `limit` rows.
///
/// `area` matches the prediction's scope as a case-insensitive substring;
/// unscoped predictions never match an area filter.
///
/// # Errors
///
/// Returns [`StoreError`] if the query fails or a row cannot be decoded.
pub async fn list_predictions(
    db: &dyn Database,
    limit: u32,
    area: Option<&str>,
) -> Result<Vec<Prediction>, StoreError> {
    let rows = match area.map(fold_area).filter(|a| !a.is_empty()) {
        Some(needle) => {
            db.query_raw_params(
                "SELECT id, area, insights, confidence, prediction_text, timestamp
                 FROM predictions
                 WHERE area_folded LIKE '%' || ? || '%' ESCAPE '\\'
                 ORDER BY seq DESC
                 LIMIT ?",
                &[DatabaseValue::String(escape_like(&needle)), limit_value(limit)],
            )
            .await?
        }
        None => {
            db.query_raw_params(
                "SELECT id, area, insights, confidence, prediction_text, timestamp
                 FROM predictions
                 ORDER BY seq DESC
                 LIMIT ?",
                &[limit_value(limit)],
            )
            .await?
        }
    };

    rows.iter().map(row_to_prediction).collect()
}

/// Converts a database row into a [`Prediction`].
fn row_to_prediction(row: &switchy_database::Row) -> Result<Prediction, StoreError> {
    let insights_json: String = row.to_value("insights").unwrap_or_default();
    let insights: Vec<String> =
        serde_json::from_str(&insights_json).map_err(|e| StoreError::Corrupt {
            table: TABLE,
            message: format!("invalid insights '{insights_json}': {e}"),
        })?;

    let confidence_label: String = row.to_value("confidence").unwrap_or_default();
    let confidence: Confidence = confidence_label.parse().map_err(|_| StoreError::Corrupt {
        table: TABLE,
        message: format!("unknown confidence '{confidence_label}'"),
    })?;

    let timestamp: String = row.to_value("timestamp").unwrap_or_default();

    Ok(Prediction {
        id: row.to_value("id").unwrap_or_default(),
        area: row.to_value("area").unwrap_or(None),
        insights,
        confidence,
        prediction_text: row.to_value("prediction_text").unwrap_or_default(),
        timestamp: parse_timestamp(TABLE, &timestamp)?,
    })
}
