//! Crime report records and submission validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CrimeType;

/// Reporter label used when a submission does not name one.
pub const ANONYMOUS_REPORTER: &str = "Anonymous";

/// Errors raised when caller-supplied input does not satisfy the report
/// schema or query constraints. Raised before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// One or more required fields were absent or blank after trimming.
    #[error("Missing or empty required field(s): {}", .fields.join(", "))]
    MissingFields {
        /// Names of the offending fields, in schema order.
        fields: Vec<&'static str>,
    },

    /// The crime type is not one of the fixed enumeration.
    #[error("Invalid crime_type '{value}': expected one of {}", CrimeType::labels().join(", "))]
    InvalidCrimeType {
        /// The rejected value, as submitted.
        value: String,
    },

    /// A result limit was not a positive integer.
    #[error("Invalid limit {value}: must be a positive integer")]
    InvalidLimit {
        /// The rejected limit.
        value: i64,
    },
}

/// A report submission as received from a caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCrimeReport {
    /// Crime type label; must name a [`CrimeType`].
    pub crime_type: String,
    /// Neighborhood-level area label.
    pub area: String,
    /// Specific address or place.
    pub location: String,
    /// Free-text description of the incident.
    pub description: String,
    /// Who filed the report. Blank or absent means anonymous.
    pub reported_by: Option<String>,
}

/// A submission that passed validation, with all text fields trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedReport {
    /// Parsed crime type.
    pub crime_type: CrimeType,
    /// Trimmed area label.
    pub area: String,
    /// Trimmed location.
    pub location: String,
    /// Trimmed description.
    pub description: String,
    /// Trimmed reporter label, defaulted to [`ANONYMOUS_REPORTER`].
    pub reported_by: String,
}

impl NewCrimeReport {
    /// Checks the submission against the report schema.
    ///
    /// All blank required fields are reported together; the crime type is
    /// only checked once every required field is present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingFields`] if `crime_type`, `area`,
    /// `location`, or `description` is blank, and
    /// [`ValidationError::InvalidCrimeType`] if the crime type is not one of
    /// the fixed enumeration.
    pub fn validate(&self) -> Result<ValidatedReport, ValidationError> {
        let required = [
            ("crime_type", self.crime_type.trim()),
            ("area", self.area.trim()),
            ("location", self.location.trim()),
            ("description", self.description.trim()),
        ];

        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(ValidationError::MissingFields { fields: missing });
        }

        let crime_type: CrimeType =
            required[0]
                .1
                .parse()
                .map_err(|_| ValidationError::InvalidCrimeType {
                    value: self.crime_type.clone(),
                })?;

        let reported_by = self
            .reported_by
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(ANONYMOUS_REPORTER)
            .to_string();

        Ok(ValidatedReport {
            crime_type,
            area: required[1].1.to_string(),
            location: required[2].1.to_string(),
            description: required[3].1.to_string(),
            reported_by,
        })
    }
}

/// A stored crime report. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrimeReport {
    /// Unique identifier (UUID), assigned at creation.
    pub id: String,
    /// Crime type.
    pub crime_type: CrimeType,
    /// Neighborhood-level area label.
    pub area: String,
    /// Specific address or place.
    pub location: String,
    /// Free-text description.
    pub description: String,
    /// Who filed the report.
    pub reported_by: String,
    /// Server-side creation time.
    pub timestamp: DateTime<Utc>,
}

impl CrimeReport {
    /// Builds a report from a validated submission with a server-assigned
    /// identifier and timestamp.
    #[must_use]
    pub fn from_validated(report: ValidatedReport, id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            crime_type: report.crime_type,
            area: report.area,
            location: report.location,
            description: report.description,
            reported_by: report.reported_by,
            timestamp,
        }
    }
}

/// Folds an area label to the form used for case-insensitive matching.
///
/// Trims surrounding whitespace and lowercases with full Unicode case
/// mapping, so `"  ÖSTERMALM "` and `"Östermalm"` fold to the same key.
#[must_use]
pub fn fold_area(area: &str) -> String {
    area.trim().to_lowercase()
}

/// Optional filters for listing reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    /// Case-insensitive substring match against the report's area.
    pub area: Option<String>,
    /// Exact crime type match.
    pub crime_type: Option<CrimeType>,
}

impl ReportFilter {
    /// The folded area needle, or `None` when no area filter is active.
    ///
    /// A blank area counts as no filter.
    #[must_use]
    pub fn area_needle(&self) -> Option<String> {
        self.area
            .as_deref()
            .map(fold_area)
            .filter(|needle| !needle.is_empty())
    }
}
