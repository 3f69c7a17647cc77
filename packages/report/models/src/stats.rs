//! Aggregate statistics over the report set.

use serde::{Deserialize, Serialize};

use crate::CrimeType;

/// Report count for a single area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaCount {
    /// Area label, as submitted (trimmed). Labels that differ only in case
    /// are counted separately.
    pub area: String,
    /// Number of reports filed for this area.
    pub count: u64,
}

/// Report count for a single crime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    /// Crime type.
    #[serde(rename = "type")]
    pub crime_type: CrimeType,
    /// Number of reports of this type.
    pub count: u64,
}

/// Point-in-time statistics over every stored report.
///
/// Both sequences are sorted by count descending, ties broken by name
/// ascending. The per-sequence counts always sum to `total_reports`.
///
/// `by_area` groups by the exact stored label, so `"Downtown"` and
/// `"downtown"` are two entries. Area filters and prediction scopes fold
/// case instead (see [`fold_area`](crate::fold_area)); a prediction scoped
/// to either label covers the reports of both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Count of all reports.
    pub total_reports: u64,
    /// Counts grouped by area.
    pub by_area: Vec<AreaCount>,
    /// Counts grouped by crime type.
    pub by_type: Vec<TypeCount>,
}

impl StatsSnapshot {
    /// Returns the count recorded for `area`, if any.
    #[must_use]
    pub fn area_count(&self, area: &str) -> Option<u64> {
        self.by_area
            .iter()
            .find(|entry| entry.area == area)
            .map(|entry| entry.count)
    }

    /// Returns the count recorded for `crime_type`, if any.
    #[must_use]
    pub fn type_count(&self, crime_type: CrimeType) -> Option<u64> {
        self.by_type
            .iter()
            .find(|entry| entry.crime_type == crime_type)
            .map(|entry| entry.count)
    }
}
