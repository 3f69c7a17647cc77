//! Generated prediction records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Coarse reliability label attached to a prediction.
///
/// Derived from the scoped sample size and how concentrated it is on one
/// crime type; it is not a statistical measure.
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
pub enum Confidence {
    /// Fewer than three reports in scope.
    Low,
    /// Enough reports to describe, not enough to be decisive.
    Medium,
    /// A large sample dominated by a single crime type.
    High,
}

/// A persisted, immutable prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    /// Unique identifier (UUID).
    pub id: String,
    /// Area scope; `None` means every area.
    pub area: Option<String>,
    /// Short insight tags, in generation order.
    pub insights: Vec<String>,
    /// Reliability label.
    pub confidence: Confidence,
    /// Multi-paragraph narrative mentioning every insight.
    pub prediction_text: String,
    /// Server-side creation time.
    pub timestamp: DateTime<Utc>,
}
