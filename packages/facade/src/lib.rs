#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Single entry point for every portal operation.
//!
//! [`Portal`] owns the report store, the in-memory aggregates, and the
//! prediction engine, and is the only place that touches more than one of
//! them. Transports (the HTTP server, the operator CLI) call into it and
//! map [`PortalError`] onto their own failure shapes.

use std::sync::Arc;

use chrono::{SubsecRound as _, Utc};
use crime_portal_ai::{AiError, Forecaster, PredictionEngine};
use crime_portal_analytics::{AggregationEngine, rescan};
use crime_portal_database::{StoreError, reports};
use crime_portal_report_models::{
    CrimeReport, CrimeType, NewCrimeReport, Prediction, ReportFilter, StatsSnapshot,
    ValidationError,
};
use switchy_database::Database;
use thiserror::Error;

/// Number of reports listed when the caller gives no limit.
pub const DEFAULT_REPORT_LIMIT: u32 = 50;

/// Number of predictions listed when the caller gives no limit.
pub const DEFAULT_PREDICTION_LIMIT: u32 = 10;

/// Largest limit honored by any listing; larger requests are capped.
pub const MAX_LIMIT: u32 = 500;

/// Errors surfaced to portal callers.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The request was malformed. Nothing was changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No report exists with the requested id.
    #[error("Report not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The report store could not be read or written. Retryable; no
    /// partial write was persisted.
    #[error(transparent)]
    StorageUnavailable(#[from] StoreError),

    /// The forecaster failed to produce a prediction. Retryable.
    #[error("Prediction unavailable: {0}")]
    ForecasterUnavailable(String),
}

impl From<AiError> for PortalError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Store(e) => Self::StorageUnavailable(e),
            AiError::Forecaster { message } => Self::ForecasterUnavailable(message),
        }
    }
}

/// Result of comparing the incremental aggregates with a full rescan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsVerification {
    /// What `stats()` currently serves.
    pub incremental: StatsSnapshot,
    /// What a full rescan of the store produces.
    pub rescanned: StatsSnapshot,
}

impl StatsVerification {
    /// Returns `true` if both paths agree exactly.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.incremental == self.rescanned
    }
}

/// The crime portal: report intake, listing, statistics, and predictions.
pub struct Portal {
    db: Arc<dyn Database>,
    aggregates: AggregationEngine,
    predictions: PredictionEngine,
}

impl Portal {
    /// Creates a portal over an opened database.
    ///
    /// Aggregates are rebuilt from a full scan of the stored reports, so
    /// counts carry over across restarts.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::StorageUnavailable`] if the stored reports
    /// cannot be read.
    pub async fn open(db: Box<dyn Database>) -> Result<Self, PortalError> {
        let db: Arc<dyn Database> = Arc::from(db);
        let stored = reports::scan_reports(db.as_ref(), None).await?;
        let aggregates = AggregationEngine::from_reports(&stored);

        log::info!("Portal opened with {} stored report(s)", stored.len());

        Ok(Self {
            db,
            aggregates,
            predictions: PredictionEngine::default(),
        })
    }

    /// Replaces the forecaster used for new predictions.
    #[must_use]
    pub fn with_forecaster(mut self, forecaster: Box<dyn Forecaster>) -> Self {
        self.predictions = PredictionEngine::new(forecaster);
        self
    }

    /// Validates and stores a new report, then counts it.
    ///
    /// The id and timestamp are assigned here. The store append and the
    /// aggregate update happen as one step: if the append fails, no count
    /// changes.
    ///
    /// # Errors
    ///
    /// * [`PortalError::Validation`] if a required field is blank or the
    ///   crime type is unknown
    /// * [`PortalError::StorageUnavailable`] if the append fails
    pub async fn submit_report(&self, input: &NewCrimeReport) -> Result<CrimeReport, PortalError> {
        let validated = input.validate().inspect_err(|e| {
            log::debug!("Rejected report submission: {e}");
        })?;

        let report = CrimeReport::from_validated(
            validated,
            uuid::Uuid::new_v4().to_string(),
            Utc::now().trunc_subsecs(6),
        );

        self.aggregates
            .commit_insert(&report, reports::insert_report(self.db.as_ref(), &report))
            .await
            .inspect_err(|e| log::error!("Failed to store report {}: {e}", report.id))?;

        log::info!(
            "Accepted {} report {} in {}",
            report.crime_type,
            report.id,
            report.area
        );

        Ok(report)
    }

    /// Lists stored reports newest-first.
    ///
    /// # Errors
    ///
    /// * [`PortalError::Validation`] if `limit` is zero
    /// * [`PortalError::StorageUnavailable`] if the store cannot be read
    pub async fn list_reports(
        &self,
        limit: Option<u32>,
        filter: &ReportFilter,
    ) -> Result<Vec<CrimeReport>, PortalError> {
        let limit = resolve_limit(limit, DEFAULT_REPORT_LIMIT)?;
        Ok(reports::list_reports(self.db.as_ref(), limit, filter).await?)
    }

    /// Looks up one report by id.
    ///
    /// # Errors
    ///
    /// * [`PortalError::NotFound`] if no report has that id
    /// * [`PortalError::StorageUnavailable`] if the store cannot be read
    pub async fn get_report(&self, id: &str) -> Result<CrimeReport, PortalError> {
        reports::get_report(self.db.as_ref(), id)
            .await?
            .ok_or_else(|| PortalError::NotFound { id: id.to_string() })
    }

    /// Current statistics, served from the in-memory aggregates.
    pub async fn stats(&self) -> StatsSnapshot {
        self.aggregates.snapshot().await
    }

    /// Compares the served statistics against a full rescan of the store.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::StorageUnavailable`] if the store cannot be
    /// read.
    pub async fn verify_stats(&self) -> Result<StatsVerification, PortalError> {
        let stored = reports::scan_reports(self.db.as_ref(), None).await?;
        let incremental = self.aggregates.snapshot().await;
        let rescanned = rescan(&stored);

        if incremental != rescanned {
            log::warn!(
                "Aggregates drifted: {} counted, {} stored",
                incremental.total_reports,
                rescanned.total_reports
            );
        }

        Ok(StatsVerification {
            incremental,
            rescanned,
        })
    }

    /// Generates and stores a prediction for `area`, or for every area.
    ///
    /// A scope without reports still yields a (low confidence) prediction.
    ///
    /// # Errors
    ///
    /// * [`PortalError::StorageUnavailable`] if reports cannot be read or
    ///   the prediction cannot be stored
    /// * [`PortalError::ForecasterUnavailable`] if the forecaster fails
    pub async fn generate_prediction(&self, area: Option<&str>) -> Result<Prediction, PortalError> {
        Ok(self.predictions.generate(self.db.as_ref(), area).await?)
    }

    /// Lists stored predictions newest-first.
    ///
    /// # Errors
    ///
    /// * [`PortalError::Validation`] if `limit` is zero
    /// * [`PortalError::StorageUnavailable`] if the store cannot be read
    pub async fn list_predictions(
        &self,
        limit: Option<u32>,
        area: Option<&str>,
    ) -> Result<Vec<Prediction>, PortalError> {
        let limit = resolve_limit(limit, DEFAULT_PREDICTION_LIMIT)?;
        Ok(self.predictions.list(self.db.as_ref(), limit, area).await?)
    }

    /// The fixed set of crime types a report may carry.
    #[must_use]
    pub const fn crime_types() -> &'static [CrimeType] {
        CrimeType::all()
    }
}

fn resolve_limit(limit: Option<u32>, default: u32) -> Result<u32, ValidationError> {
    match limit {
        None => Ok(default),
        Some(0) => Err(ValidationError::InvalidLimit { value: 0 }),
        Some(n) => Ok(n.min(MAX_LIMIT)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crime_portal_ai::Forecast;
    use crime_portal_report_models::Confidence;

    use super::*;

    async fn temp_portal(tag: &str) -> (Portal, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "crime_portal_facade_{tag}_{}.db",
            uuid::Uuid::new_v4()
        ));
        let db = crime_portal_database::open_db(&path).await.unwrap();
        (Portal::open(db).await.unwrap(), path)
    }

    fn submission(crime_type: &str, area: &str) -> NewCrimeReport {
        NewCrimeReport {
            crime_type: crime_type.to_string(),
            area: area.to_string(),
            location: "Main St".to_string(),
            description: "Reported incident".to_string(),
            reported_by: None,
        }
    }

    #[tokio::test]
    async fn submitted_burglary_shows_up_everywhere() {
        let (portal, path) = temp_portal("burglary").await;

        let report = portal
            .submit_report(&NewCrimeReport {
                crime_type: "Burglary".to_string(),
                area: "Downtown".to_string(),
                location: "5th Ave".to_string(),
                description: "Window broken".to_string(),
                reported_by: Some("Jane".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(report.crime_type, CrimeType::Burglary);
        assert_eq!(report.reported_by, "Jane");
        assert!(!report.id.is_empty());

        let listed = portal
            .list_reports(Some(1), &ReportFilter::default())
            .await
            .unwrap();
        assert_eq!(listed, vec![report.clone()]);
        assert_eq!(portal.get_report(&report.id).await.unwrap(), report);

        let stats = portal.stats().await;
        assert_eq!(stats.total_reports, 1);
        assert_eq!(stats.area_count("Downtown"), Some(1));
        assert_eq!(stats.type_count(CrimeType::Burglary), Some(1));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn invalid_submissions_change_nothing() {
        let (portal, path) = temp_portal("invalid").await;

        let err = portal
            .submit_report(&submission("Jaywalking", "Downtown"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PortalError::Validation(ValidationError::InvalidCrimeType { .. })
        ));

        let err = portal
            .submit_report(&submission("Theft", "   "))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PortalError::Validation(ValidationError::MissingFields { .. })
        ));

        assert_eq!(portal.stats().await, StatsSnapshot::default());
        assert!(
            portal
                .list_reports(None, &ReportFilter::default())
                .await
                .unwrap()
                .is_empty()
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn duplicate_content_is_accepted_as_separate_reports() {
        let (portal, path) = temp_portal("duplicates").await;

        let a = portal.submit_report(&submission("Theft", "Uptown")).await.unwrap();
        let b = portal.submit_report(&submission("Theft", "Uptown")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(portal.stats().await.area_count("Uptown"), Some(2));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn limits_default_cap_and_reject_zero() {
        let (portal, path) = temp_portal("limits").await;
        for _ in 0..3 {
            portal.submit_report(&submission("Fraud", "Harbor")).await.unwrap();
        }

        let all = ReportFilter::default();
        assert_eq!(portal.list_reports(None, &all).await.unwrap().len(), 3);
        assert_eq!(portal.list_reports(Some(2), &all).await.unwrap().len(), 2);
        assert_eq!(
            portal.list_reports(Some(u32::MAX), &all).await.unwrap().len(),
            3
        );
        assert!(matches!(
            portal.list_reports(Some(0), &all).await.unwrap_err(),
            PortalError::Validation(ValidationError::InvalidLimit { value: 0 })
        ));
        assert!(matches!(
            portal.list_predictions(Some(0), None).await.unwrap_err(),
            PortalError::Validation(_)
        ));
        assert_eq!(resolve_limit(Some(10_000), 50), Ok(MAX_LIMIT));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_report_is_not_found() {
        let (portal, path) = temp_portal("missing").await;
        assert!(matches!(
            portal.get_report("no-such-id").await.unwrap_err(),
            PortalError::NotFound { id } if id == "no-such-id"
        ));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn aggregates_survive_reopen_and_match_rescan() {
        let path = std::env::temp_dir().join(format!(
            "crime_portal_facade_reopen_{}.db",
            uuid::Uuid::new_v4()
        ));

        {
            let db = crime_portal_database::open_db(&path).await.unwrap();
            let portal = Portal::open(db).await.unwrap();
            for (crime_type, area) in [
                ("Theft", "Downtown"),
                ("Assault", "Downtown"),
                ("Vandalism", "Park Area"),
                ("theft", "Park Area"),
            ] {
                portal.submit_report(&submission(crime_type, area)).await.unwrap();
            }
            assert!(portal.verify_stats().await.unwrap().is_consistent());
        }

        let db = crime_portal_database::open_db(&path).await.unwrap();
        let portal = Portal::open(db).await.unwrap();
        let stats = portal.stats().await;
        assert_eq!(stats.total_reports, 4);
        assert_eq!(stats.type_count(CrimeType::Theft), Some(2));

        let verification = portal.verify_stats().await.unwrap();
        assert!(verification.is_consistent());
        assert_eq!(
            serde_json::to_string(&verification.incremental).unwrap(),
            serde_json::to_string(&verification.rescanned).unwrap()
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn failed_append_does_not_count() {
        let (portal, path) = temp_portal("unavailable").await;
        portal.submit_report(&submission("Theft", "Downtown")).await.unwrap();

        let other = switchy_database_connection::init_sqlite_rusqlite(Some(path.as_path())).unwrap();
        other.exec_raw("DROP TABLE crime_reports").await.unwrap();

        let err = portal
            .submit_report(&submission("Theft", "Downtown"))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::StorageUnavailable(_)));
        assert_eq!(portal.stats().await.area_count("Downtown"), Some(1));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn predictions_are_generated_and_listed() {
        let (portal, path) = temp_portal("predictions").await;

        let empty = portal.generate_prediction(Some("Harbor")).await.unwrap();
        assert_eq!(empty.confidence, Confidence::Low);
        assert!(empty.insights.is_empty());

        for _ in 0..4 {
            portal.submit_report(&submission("Theft", "Downtown")).await.unwrap();
        }
        let scoped = portal.generate_prediction(Some(" downtown ")).await.unwrap();
        assert_eq!(scoped.area.as_deref(), Some("downtown"));
        assert_eq!(scoped.insights[0], "Dominant type: Theft");

        let listed = portal.list_predictions(None, None).await.unwrap();
        assert_eq!(listed, vec![scoped.clone(), empty]);

        let filtered = portal.list_predictions(None, Some("DOWN")).await.unwrap();
        assert_eq!(filtered, vec![scoped]);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn non_ascii_scope_finds_its_reports() {
        let (portal, path) = temp_portal("non_ascii").await;
        for crime_type in ["Theft", "Theft", "Fraud"] {
            portal
                .submit_report(&submission(crime_type, "Östermalm"))
                .await
                .unwrap();
        }

        let prediction = portal.generate_prediction(Some("ÖSTERMALM")).await.unwrap();
        assert_eq!(prediction.confidence, Confidence::Medium);
        assert_eq!(prediction.insights[0], "Dominant type: Theft");

        let listed = portal
            .list_reports(
                None,
                &ReportFilter {
                    area: Some("östermalm".to_string()),
                    crime_type: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(listed.len(), 3);

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn stats_group_exact_labels_while_scope_folds_case() {
        let (portal, path) = temp_portal("label_case").await;
        portal.submit_report(&submission("Theft", "Downtown")).await.unwrap();
        portal.submit_report(&submission("Theft", "downtown")).await.unwrap();

        let stats = portal.stats().await;
        assert_eq!(stats.area_count("Downtown"), Some(1));
        assert_eq!(stats.area_count("downtown"), Some(1));

        let scoped = portal.generate_prediction(Some("DOWNTOWN")).await.unwrap();
        assert!(scoped.prediction_text.contains("(2 of 2, 100%)"));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submits_never_diverge_from_the_store() {
        let (portal, path) = temp_portal("concurrent").await;
        let portal = Arc::new(portal);
        let areas = ["Downtown", "Harbor", "Östermalm"];

        let mut submits = Vec::new();
        for n in 0..30 {
            let portal = Arc::clone(&portal);
            let area = areas[n % areas.len()];
            submits.push(tokio::spawn(async move {
                portal.submit_report(&submission("Vandalism", area)).await.unwrap();
            }));
        }

        let mut checks = Vec::new();
        for _ in 0..10 {
            let portal = Arc::clone(&portal);
            checks.push(tokio::spawn(async move {
                let stats = portal.stats().await;
                assert_eq!(
                    stats.by_area.iter().map(|c| c.count).sum::<u64>(),
                    stats.total_reports
                );
                assert_eq!(
                    stats.type_count(CrimeType::Vandalism).unwrap_or(0),
                    stats.total_reports
                );
                portal.verify_stats().await.unwrap();
            }));
        }

        for handle in submits.into_iter().chain(checks) {
            handle.await.unwrap();
        }

        let verification = portal.verify_stats().await.unwrap();
        assert!(verification.is_consistent());
        assert_eq!(verification.incremental.total_reports, 30);
        for area in areas {
            assert_eq!(verification.incremental.area_count(area), Some(10));
        }

        let _ = std::fs::remove_file(&path);
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl Forecaster for Unreachable {
        async fn forecast(
            &self,
            _scope: Option<&str>,
            _reports: &[CrimeReport],
        ) -> Result<Forecast, AiError> {
            Err(AiError::Forecaster {
                message: "upstream timeout".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn forecaster_failure_is_surfaced() {
        let (portal, path) = temp_portal("forecaster").await;
        let portal = portal.with_forecaster(Box::new(Unreachable));

        assert!(matches!(
            portal.generate_prediction(None).await.unwrap_err(),
            PortalError::ForecasterUnavailable(message) if message == "upstream timeout"
        ));
        assert!(portal.list_predictions(None, None).await.unwrap().is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn crime_types_list_every_label_once() {
        let labels: Vec<String> = Portal::crime_types().iter().map(ToString::to_string).collect();
        assert_eq!(labels.len(), 10);
        assert!(labels.contains(&"Drug-related".to_string()));
        assert!(labels.contains(&"Domestic Violence".to_string()));
    }
}
