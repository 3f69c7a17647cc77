#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime pattern prediction engine.
//!
//! A prediction is produced by scanning every stored report in scope (one
//! area, or all of them), handing the scan to a [`Forecaster`], and
//! persisting the result so it can be listed later unchanged.
//!
//! The shipped forecaster, [`pattern::PatternForecaster`], is a
//! deterministic summarizer: dominant crime type, hotspots, and a
//! recency trend, rendered into a narrative. Any other forecaster (for
//! example one backed by a hosted model) can be swapped in behind the same
//! trait without changing callers.

pub mod narrative;
pub mod pattern;

use chrono::{SubsecRound as _, Utc};
use crime_portal_database::{StoreError, predictions, reports};
use crime_portal_report_models::{Confidence, CrimeReport, Prediction};
use switchy_database::Database;
use thiserror::Error;

/// Errors that can occur while generating or listing predictions.
#[derive(Debug, Error)]
pub enum AiError {
    /// Reading reports or persisting the prediction failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The forecaster could not produce a result.
    #[error("Forecaster error: {message}")]
    Forecaster {
        /// Description of what went wrong.
        message: String,
    },
}

/// The content of a prediction, before it is given an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forecast {
    /// Short insight tags, in order.
    pub insights: Vec<String>,
    /// Reliability label.
    pub confidence: Confidence,
    /// Narrative that mentions every insight tag.
    pub prediction_text: String,
}

/// Turns a scan of reports into a forecast.
#[async_trait::async_trait]
pub trait Forecaster: Send + Sync {
    /// Produces a forecast for `scope` from `reports`, which holds every
    /// stored report in that scope, oldest first.
    ///
    /// An empty `reports` slice must still yield a forecast.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Forecaster`] if the forecast cannot be produced.
    async fn forecast(
        &self,
        scope: Option<&str>,
        reports: &[CrimeReport],
    ) -> Result<Forecast, AiError>;
}

/// Generates, persists, and lists predictions.
pub struct PredictionEngine {
    forecaster: Box<dyn Forecaster>,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(Box::new(pattern::PatternForecaster))
    }
}

impl PredictionEngine {
    /// Creates an engine backed by `forecaster`.
    #[must_use]
    pub fn new(forecaster: Box<dyn Forecaster>) -> Self {
        Self { forecaster }
    }

    /// Generates a prediction for `area` (or all areas) and persists it.
    ///
    /// A scope with no reports is not an error: the forecast comes back
    /// with [`Confidence::Low`] and no insights.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Store`] if the reports cannot be read or the
    /// prediction cannot be stored, and [`AiError::Forecaster`] if the
    /// forecaster fails.
    pub async fn generate(
        &self,
        db: &dyn Database,
        area: Option<&str>,
    ) -> Result<Prediction, AiError> {
        let scope = area.map(str::trim).filter(|a| !a.is_empty());
        let scanned = reports::scan_reports(db, scope).await?;

        log::debug!(
            "Forecasting {} over {} report(s)",
            scope.unwrap_or("all areas"),
            scanned.len()
        );

        let forecast = self.forecaster.forecast(scope, &scanned).await?;

        let prediction = Prediction {
            id: uuid::Uuid::new_v4().to_string(),
            area: scope.map(str::to_string),
            insights: forecast.insights,
            confidence: forecast.confidence,
            prediction_text: forecast.prediction_text,
            // Stored at microsecond precision.
            timestamp: Utc::now().trunc_subsecs(6),
        };

        predictions::insert_prediction(db, &prediction).await?;

        log::info!(
            "Generated prediction {} for {} ({} confidence, {} insight(s))",
            prediction.id,
            scope.unwrap_or("all areas"),
            prediction.confidence,
            prediction.insights.len()
        );

        Ok(prediction)
    }

    /// Lists persisted predictions newest-first.
    ///
    /// # Errors
    ///
    /// Returns [`AiError::Store`] if the predictions cannot be read.
    pub async fn list(
        &self,
        db: &dyn Database,
        limit: u32,
        area: Option<&str>,
    ) -> Result<Vec<Prediction>, AiError> {
        Ok(predictions::list_predictions(db, limit, area).await?)
    }
}
