#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crime portal server.
//!
//! Request bodies are strict: unknown fields are rejected. Missing report
//! fields are accepted at this layer and left to report validation, so that
//! a blank and an absent field fail the same way.

use crime_portal_report_models::{CrimeType, NewCrimeReport, ReportFilter, ValidationError};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/reports`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitReportRequest {
    /// Crime type label.
    pub crime_type: Option<String>,
    /// Area label.
    pub area: Option<String>,
    /// Specific location.
    pub location: Option<String>,
    /// Incident description.
    pub description: Option<String>,
    /// Reporter name.
    pub reported_by: Option<String>,
    /// Client-side timestamp. Accepted for compatibility and discarded;
    /// the server always assigns its own.
    #[serde(default)]
    pub timestamp: Option<IgnoredAny>,
}

impl From<SubmitReportRequest> for NewCrimeReport {
    fn from(req: SubmitReportRequest) -> Self {
        Self {
            crime_type: req.crime_type.unwrap_or_default(),
            area: req.area.unwrap_or_default(),
            location: req.location.unwrap_or_default(),
            description: req.description.unwrap_or_default(),
            reported_by: req.reported_by,
        }
    }
}

/// Body of `POST /api/predict`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictRequest {
    /// Area to scope the prediction to; absent or blank means every area.
    pub area: Option<String>,
}

/// Query parameters for `GET /api/reports`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQueryParams {
    /// Maximum number of reports to return.
    pub limit: Option<i64>,
    /// Case-insensitive substring of the area.
    pub area: Option<String>,
    /// Exact crime type label.
    pub crime_type: Option<String>,
}

impl ReportQueryParams {
    /// The requested limit, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLimit`] if the limit is not
    /// positive.
    pub fn limit(&self) -> Result<Option<u32>, ValidationError> {
        parse_limit(self.limit)
    }

    /// Builds the listing filter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCrimeType`] if `crime_type` names
    /// an unknown type.
    pub fn filter(&self) -> Result<ReportFilter, ValidationError> {
        let crime_type = match self.crime_type.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(label.parse::<CrimeType>().map_err(|_| {
                ValidationError::InvalidCrimeType {
                    value: label.to_string(),
                }
            })?),
        };

        Ok(ReportFilter {
            area: self
                .area
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            crime_type,
        })
    }
}

/// Query parameters for `GET /api/predictions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionQueryParams {
    /// Maximum number of predictions to return.
    pub limit: Option<i64>,
    /// Case-insensitive substring of the prediction's area.
    pub area: Option<String>,
}

impl PredictionQueryParams {
    /// The requested limit, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLimit`] if the limit is not
    /// positive.
    pub fn limit(&self) -> Result<Option<u32>, ValidationError> {
        parse_limit(self.limit)
    }
}

fn parse_limit(limit: Option<i64>) -> Result<Option<u32>, ValidationError> {
    match limit {
        None => Ok(None),
        Some(value) if value < 1 => Err(ValidationError::InvalidLimit { value }),
        Some(value) => Ok(Some(u32::try_from(value).unwrap_or(u32::MAX))),
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// Plain message response, used for the API banner.
#[derive(Debug, Serialize)]
pub struct ApiMessage {
    /// Human-readable message.
    pub message: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}

impl ApiError {
    /// Creates an error body from anything displayable.
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}
