//! Deterministic pattern summarization over a report scan.
//!
//! Given the same reports, [`analyze`] always produces the same
//! [`PatternAnalysis`]: every ranking breaks ties by name, and no clock,
//! randomness, or external service is consulted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use crime_portal_report_models::{Confidence, CrimeReport, CrimeType};

use crate::{AiError, Forecast, Forecaster, narrative};

/// Minimum scoped report count for [`Confidence::High`].
pub const HIGH_CONFIDENCE_MIN_REPORTS: u64 = 10;

/// Minimum scoped report count for [`Confidence::Medium`].
pub const MEDIUM_CONFIDENCE_MIN_REPORTS: u64 = 3;

/// Dominant-type share (in percent) that must be exceeded for
/// [`Confidence::High`].
pub const HIGH_CONFIDENCE_DOMINANT_SHARE_PCT: u64 = 40;

/// Maximum number of hotspots reported.
pub const MAX_HOTSPOTS: usize = 3;

/// Minimum report count for a trend to be estimated.
const MIN_TREND_REPORTS: u64 = 3;

/// Recent-over-earlier rate ratio above which activity counts as rising.
const RISING_RATIO: f64 = 1.25;

/// Recent-over-earlier rate ratio below which activity counts as falling.
const FALLING_RATIO: f64 = 0.8;

/// What hotspots are ranked over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotspotKind {
    /// Unscoped analysis ranks whole areas.
    Area,
    /// Area-scoped analysis ranks specific locations within the area.
    Location,
}

/// A place with a high report count within the scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotspot {
    /// Area or location label.
    pub name: String,
    /// Reports filed there.
    pub count: u64,
}

/// The most frequent crime type in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DominantType {
    /// The crime type.
    pub crime_type: CrimeType,
    /// Reports of that type.
    pub count: u64,
}

/// Direction of report volume over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    /// The recent third sees a higher report rate than before.
    Rising,
    /// Report rate is roughly flat.
    Stable,
    /// The recent third sees a lower report rate than before.
    Falling,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rising => write!(f, "rising"),
            Self::Stable => write!(f, "stable"),
            Self::Falling => write!(f, "falling"),
        }
    }
}

/// Recency comparison between the last third of the covered time range and
/// the two thirds before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trend {
    /// Overall direction.
    pub direction: TrendDirection,
    /// Reports at or after the cutoff.
    pub recent: u64,
    /// Reports before the cutoff.
    pub earlier: u64,
}

/// Everything derived from one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternAnalysis {
    /// Area scope, or `None` for all areas.
    pub scope: Option<String>,
    /// Reports in scope.
    pub report_count: u64,
    /// Earliest and latest report times in scope.
    pub period: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// Most frequent crime type.
    pub dominant: Option<DominantType>,
    /// What [`Self::hotspots`] ranks.
    pub hotspot_kind: HotspotKind,
    /// Up to [`MAX_HOTSPOTS`] busiest places, busiest first.
    pub hotspots: Vec<Hotspot>,
    /// Recency trend, when the reports span enough time to estimate one.
    pub trend: Option<Trend>,
    /// Derived reliability label.
    pub confidence: Confidence,
}

impl PatternAnalysis {
    /// Share of scoped reports that carry the dominant type, in whole
    /// percent (rounded down).
    #[must_use]
    pub fn dominant_share_pct(&self) -> u64 {
        match self.dominant {
            Some(dominant) if self.report_count > 0 => dominant.count * 100 / self.report_count,
            _ => 0,
        }
    }

    /// Short insight tags, in the order they are presented.
    #[must_use]
    pub fn insights(&self) -> Vec<String> {
        let mut insights = Vec::new();

        if let Some(dominant) = self.dominant {
            insights.push(format!("Dominant type: {}", dominant.crime_type));
        }

        for hotspot in &self.hotspots {
            insights.push(format!("Hotspot: {}", hotspot.name));
        }

        if let Some(trend) = self.trend {
            insights.push(format!("Trend: {}", trend.direction));
        }

        insights
    }
}

/// Derives the confidence label from the scoped sample.
///
/// High needs at least [`HIGH_CONFIDENCE_MIN_REPORTS`] reports with the
/// dominant type above [`HIGH_CONFIDENCE_DOMINANT_SHARE_PCT`] percent of
/// them; Medium needs at least [`MEDIUM_CONFIDENCE_MIN_REPORTS`].
#[must_use]
pub const fn derive_confidence(report_count: u64, dominant_count: u64) -> Confidence {
    if report_count >= HIGH_CONFIDENCE_MIN_REPORTS
        && dominant_count * 100 > report_count * HIGH_CONFIDENCE_DOMINANT_SHARE_PCT
    {
        Confidence::High
    } else if report_count >= MEDIUM_CONFIDENCE_MIN_REPORTS {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Analyzes every report in `scope`.
#[must_use]
pub fn analyze(scope: Option<&str>, reports: &[CrimeReport]) -> PatternAnalysis {
    let report_count = reports.len() as u64;

    let mut type_counts: HashMap<CrimeType, u64> = HashMap::new();
    for report in reports {
        *type_counts.entry(report.crime_type).or_insert(0) += 1;
    }

    let dominant = type_counts
        .into_iter()
        .max_by(|(a_type, a_count), (b_type, b_count)| {
            a_count
                .cmp(b_count)
                .then_with(|| AsRef::<str>::as_ref(b_type).cmp(AsRef::<str>::as_ref(a_type)))
        })
        .map(|(crime_type, count)| DominantType { crime_type, count });

    let hotspot_kind = if scope.is_some() {
        HotspotKind::Location
    } else {
        HotspotKind::Area
    };

    let hotspots = rank_hotspots(reports.iter().map(|r| match hotspot_kind {
        HotspotKind::Area => r.area.as_str(),
        HotspotKind::Location => r.location.as_str(),
    }));

    let period = reports
        .iter()
        .map(|r| r.timestamp)
        .min()
        .zip(reports.iter().map(|r| r.timestamp).max());

    let trend = period.and_then(|(start, end)| estimate_trend(reports, start, end));

    let confidence = derive_confidence(report_count, dominant.map_or(0, |d| d.count));

    PatternAnalysis {
        scope: scope.map(str::to_string),
        report_count,
        period,
        dominant,
        hotspot_kind,
        hotspots,
        trend,
        confidence,
    }
}

/// Ranks place labels by frequency, ties broken by name ascending.
fn rank_hotspots<'a>(names: impl Iterator<Item = &'a str>) -> Vec<Hotspot> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for name in names {
        *counts.entry(name).or_insert(0) += 1;
    }

    let mut ranked: Vec<Hotspot> = counts
        .into_iter()
        .map(|(name, count)| Hotspot {
            name: name.to_string(),
            count,
        })
        .collect();

    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(MAX_HOTSPOTS);
    ranked
}

/// Compares the report rate of the last third of `start..=end` with the
/// rate of the first two thirds.
///
/// Returns `None` when there are too few reports or they all share one
/// instant.
fn estimate_trend(
    reports: &[CrimeReport],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<Trend> {
    let span = end - start;
    if (reports.len() as u64) < MIN_TREND_REPORTS || span.is_zero() {
        return None;
    }

    let cutoff = end - span / 3;
    let recent = reports.iter().filter(|r| r.timestamp >= cutoff).count() as u64;
    let earlier = reports.len() as u64 - recent;

    // The recent window is half as long as the earlier one, so equal rates
    // mean `2 * recent == earlier`.
    #[allow(clippy::cast_precision_loss)]
    let direction = if earlier == 0 {
        TrendDirection::Rising
    } else {
        let ratio = 2.0 * recent as f64 / earlier as f64;
        if ratio > RISING_RATIO {
            TrendDirection::Rising
        } else if ratio < FALLING_RATIO {
            TrendDirection::Falling
        } else {
            TrendDirection::Stable
        }
    };

    Some(Trend {
        direction,
        recent,
        earlier,
    })
}

/// The deterministic forecaster: [`analyze`] followed by
/// [`narrative::render`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternForecaster;

#[async_trait::async_trait]
impl Forecaster for PatternForecaster {
    async fn forecast(
        &self,
        scope: Option<&str>,
        reports: &[CrimeReport],
    ) -> Result<Forecast, AiError> {
        let analysis = analyze(scope, reports);
        let insights = analysis.insights();
        let prediction_text = narrative::render(&analysis, &insights);

        Ok(Forecast {
            insights,
            confidence: analysis.confidence,
            prediction_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone as _};

    use super::*;

    fn report_at(crime_type: CrimeType, area: &str, location: &str, hour: i64) -> CrimeReport {
        CrimeReport {
            id: format!("{area}-{location}-{hour}"),
            crime_type,
            area: area.to_string(),
            location: location.to_string(),
            description: "Reported incident".to_string(),
            reported_by: "Anonymous".to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
        }
    }

    #[test]
    fn confidence_thresholds() {
        assert_eq!(derive_confidence(0, 0), Confidence::Low);
        assert_eq!(derive_confidence(2, 2), Confidence::Low);
        assert_eq!(derive_confidence(3, 1), Confidence::Medium);
        assert_eq!(derive_confidence(9, 9), Confidence::Medium);
        assert_eq!(derive_confidence(12, 6), Confidence::High);
        // Exactly 40% is not above the threshold.
        assert_eq!(derive_confidence(10, 4), Confidence::Medium);
        assert_eq!(derive_confidence(10, 5), Confidence::High);
    }

    #[test]
    fn empty_scan_has_no_insights() {
        let analysis = analyze(Some("Downtown"), &[]);
        assert_eq!(analysis.report_count, 0);
        assert_eq!(analysis.dominant, None);
        assert!(analysis.hotspots.is_empty());
        assert_eq!(analysis.trend, None);
        assert_eq!(analysis.confidence, Confidence::Low);
        assert!(analysis.insights().is_empty());
    }

    #[test]
    fn dominant_type_ties_break_by_label() {
        let reports = vec![
            report_at(CrimeType::Vandalism, "A", "x", 0),
            report_at(CrimeType::Assault, "A", "x", 1),
        ];
        let analysis = analyze(None, &reports);
        assert_eq!(
            analysis.dominant,
            Some(DominantType {
                crime_type: CrimeType::Assault,
                count: 1,
            })
        );
    }

    #[test]
    fn unscoped_hotspots_rank_areas_scoped_rank_locations() {
        let reports = vec![
            report_at(CrimeType::Theft, "Downtown", "Main St", 0),
            report_at(CrimeType::Theft, "Downtown", "Main St", 1),
            report_at(CrimeType::Theft, "Downtown", "5th Ave", 2),
            report_at(CrimeType::Theft, "Uptown", "Oak Ave", 3),
            report_at(CrimeType::Theft, "Harbor", "Pier 9", 4),
            report_at(CrimeType::Theft, "Airport", "Gate 2", 5),
        ];

        let unscoped = analyze(None, &reports);
        assert_eq!(unscoped.hotspot_kind, HotspotKind::Area);
        let names: Vec<&str> = unscoped.hotspots.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Downtown", "Airport", "Harbor"]);

        let downtown: Vec<CrimeReport> = reports
            .iter()
            .filter(|r| r.area == "Downtown")
            .cloned()
            .collect();
        let scoped = analyze(Some("Downtown"), &downtown);
        assert_eq!(scoped.hotspot_kind, HotspotKind::Location);
        assert_eq!(
            scoped.hotspots,
            vec![
                Hotspot {
                    name: "Main St".to_string(),
                    count: 2,
                },
                Hotspot {
                    name: "5th Ave".to_string(),
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn trend_detects_rising_falling_and_stable() {
        // Span 0..=30h, cutoff at 20h.
        let rising: Vec<CrimeReport> = [0, 10, 20, 25, 28, 30]
            .iter()
            .map(|h| report_at(CrimeType::Theft, "A", "x", *h))
            .collect();
        let trend = analyze(None, &rising).trend.unwrap();
        assert_eq!(trend.direction, TrendDirection::Rising);
        assert_eq!((trend.recent, trend.earlier), (4, 2));

        let falling: Vec<CrimeReport> = [0, 1, 2, 3, 5, 8, 30]
            .iter()
            .map(|h| report_at(CrimeType::Theft, "A", "x", *h))
            .collect();
        assert_eq!(
            analyze(None, &falling).trend.unwrap().direction,
            TrendDirection::Falling
        );

        let stable: Vec<CrimeReport> = [0, 5, 10, 15, 20, 25]
            .iter()
            .map(|h| report_at(CrimeType::Theft, "A", "x", *h))
            .collect();
        // Span 0..=25h, cutoff at 16h40m: recent = {20, 25}, earlier = 4.
        assert_eq!(
            analyze(None, &stable).trend.unwrap().direction,
            TrendDirection::Stable
        );
    }

    #[test]
    fn trend_needs_spread_and_volume() {
        let same_instant: Vec<CrimeReport> = (0..5)
            .map(|_| report_at(CrimeType::Theft, "A", "x", 0))
            .collect();
        assert_eq!(analyze(None, &same_instant).trend, None);

        let two = vec![
            report_at(CrimeType::Theft, "A", "x", 0),
            report_at(CrimeType::Theft, "A", "x", 9),
        ];
        assert_eq!(analyze(None, &two).trend, None);
    }

    #[test]
    fn insights_are_ordered_dominant_hotspots_trend() {
        let reports: Vec<CrimeReport> = (0..6)
            .map(|h| report_at(CrimeType::Fraud, "Downtown", "Main St", h))
            .collect();
        let analysis = analyze(Some("Downtown"), &reports);
        assert_eq!(
            analysis.insights(),
            vec![
                "Dominant type: Fraud".to_string(),
                "Hotspot: Main St".to_string(),
                "Trend: stable".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn forecast_is_deterministic() {
        let reports: Vec<CrimeReport> = (0..12)
            .map(|h| {
                let crime_type = if h % 2 == 0 {
                    CrimeType::Theft
                } else {
                    CrimeType::Burglary
                };
                report_at(crime_type, "Downtown", "Main St", h)
            })
            .collect();

        let a = PatternForecaster.forecast(Some("Downtown"), &reports).await.unwrap();
        let b = PatternForecaster.forecast(Some("Downtown"), &reports).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.confidence, Confidence::High);
    }
}
