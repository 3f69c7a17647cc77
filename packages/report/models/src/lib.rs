#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime report, statistics, and prediction types for the crime portal.
//!
//! This crate defines the fixed crime type enumeration and the records that
//! flow between the report store, the aggregation engine, and the prediction
//! engine. Reports and predictions are immutable once constructed; the
//! statistics snapshot is a derived view and is never stored.

mod prediction;
mod report;
mod stats;

pub use prediction::{Confidence, Prediction};
pub use report::{
    ANONYMOUS_REPORTER, CrimeReport, NewCrimeReport, ReportFilter, ValidatedReport,
    ValidationError, fold_area,
};
pub use stats::{AreaCount, StatsSnapshot, TypeCount};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The fixed set of crime types a report may carry.
///
/// The string form of each variant is the label shown to (and submitted by)
/// the UI, e.g. `"Drug-related"` or `"Vehicle Crime"`. Parsing is
/// case-insensitive; display always yields the canonical label.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum CrimeType {
    /// Unlawful taking of property
    Theft,
    /// Unlawful entry to commit a crime
    Burglary,
    /// Physical attack or threat
    Assault,
    /// Willful damage to property
    Vandalism,
    /// Deception for financial gain
    Fraud,
    /// Possession, sale, or use of controlled substances
    #[serde(rename = "Drug-related")]
    #[strum(serialize = "Drug-related")]
    DrugRelated,
    /// Theft of or from a vehicle
    #[serde(rename = "Vehicle Crime")]
    #[strum(serialize = "Vehicle Crime")]
    VehicleCrime,
    /// Offenses committed through computers or networks
    Cybercrime,
    /// Abuse within a household
    #[serde(rename = "Domestic Violence")]
    #[strum(serialize = "Domestic Violence")]
    DomesticViolence,
    /// Anything not covered above
    Other,
}

impl CrimeType {
    /// Returns all variants of this enum, in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Theft,
            Self::Burglary,
            Self::Assault,
            Self::Vandalism,
            Self::Fraud,
            Self::DrugRelated,
            Self::VehicleCrime,
            Self::Cybercrime,
            Self::DomesticViolence,
            Self::Other,
        ]
    }

    /// Returns the canonical labels of every variant.
    #[must_use]
    pub fn labels() -> Vec<&'static str> {
        Self::all().iter().map(AsRef::as_ref).collect()
    }
}
