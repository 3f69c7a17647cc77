//! Prose rendering of a [`PatternAnalysis`].
//!
//! The narrative is a series of blank-line separated paragraphs. It always
//! ends with a "Key insights" list that repeats every insight tag verbatim,
//! so each tag is guaranteed to appear in the text.

use crime_portal_report_models::{Confidence, CrimeType};

use crate::pattern::{HotspotKind, PatternAnalysis, TrendDirection};

/// Renders the narrative for `analysis`. `insights` must be the tags
/// derived from the same analysis.
#[must_use]
pub fn render(analysis: &PatternAnalysis, insights: &[String]) -> String {
    let scope_label = analysis.scope.as_deref().unwrap_or("all areas");

    let mut paragraphs = vec![format!(
        "CRIME PATTERN ANALYSIS: {}",
        scope_label.to_uppercase()
    )];

    let Some(dominant) = analysis.dominant else {
        paragraphs.push(format!(
            "No crime reports are available for {scope_label} yet, so no patterns can be \
             derived. This is a baseline result, not a sign that the area is free of crime."
        ));
        paragraphs.push(format!(
            "Confidence: {}. A fuller prediction becomes possible once reports are \
             submitted for this scope.",
            Confidence::Low
        ));
        return paragraphs.join("\n\n");
    };

    paragraphs.push(overview(analysis, dominant.crime_type, dominant.count));
    paragraphs.push(hotspots(analysis));
    paragraphs.push(trend(analysis));
    paragraphs.push(format!(
        "Suggested focus: {}",
        prevention_advice(dominant.crime_type)
    ));
    paragraphs.push(confidence(analysis));

    let mut key = String::from("Key insights:");
    for insight in insights {
        key.push_str("\n- ");
        key.push_str(insight);
    }
    paragraphs.push(key);

    paragraphs.join("\n\n")
}

fn overview(analysis: &PatternAnalysis, dominant: CrimeType, dominant_count: u64) -> String {
    let period = analysis.period.map_or_else(String::new, |(start, end)| {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        if start == end {
            format!(" on {start}")
        } else {
            format!(" between {start} and {end}")
        }
    });

    format!(
        "Data overview: {count} report{plural} analyzed{period}. The most frequently \
         reported crime type is {dominant} ({dominant_count} of {count}, {share}%).",
        count = analysis.report_count,
        plural = if analysis.report_count == 1 { "" } else { "s" },
        share = analysis.dominant_share_pct(),
    )
}

fn hotspots(analysis: &PatternAnalysis) -> String {
    let kind = match analysis.hotspot_kind {
        HotspotKind::Area => "areas",
        HotspotKind::Location => "locations",
    };

    let listed: Vec<String> = analysis
        .hotspots
        .iter()
        .map(|h| {
            format!(
                "{} ({} report{})",
                h.name,
                h.count,
                if h.count == 1 { "" } else { "s" }
            )
        })
        .collect();

    format!(
        "Hotspots: reports concentrate in the following {kind}: {}.",
        listed.join(", ")
    )
}

fn trend(analysis: &PatternAnalysis) -> String {
    let Some(trend) = analysis.trend else {
        return "Trend: there is not yet enough spread in report times to estimate a trend."
            .to_string();
    };

    let outlook = match trend.direction {
        TrendDirection::Rising => "activity is picking up and is likely to continue",
        TrendDirection::Stable => "activity is holding steady",
        TrendDirection::Falling => "activity is easing off",
    };

    format!(
        "Trend: {direction}. {recent} report{plural} fell in the most recent third of the \
         period against {earlier} in the earlier two thirds; {outlook}.",
        direction = trend.direction,
        recent = trend.recent,
        plural = if trend.recent == 1 { "" } else { "s" },
        earlier = trend.earlier,
    )
}

fn confidence(analysis: &PatternAnalysis) -> String {
    let basis = match analysis.confidence {
        Confidence::High => "a large sample concentrated on one crime type",
        Confidence::Medium => "a moderate sample without a decisive concentration",
        Confidence::Low => "too few reports to support firm conclusions",
    };

    format!(
        "Confidence: {}. Based on {} report{}: {basis}.",
        analysis.confidence,
        analysis.report_count,
        if analysis.report_count == 1 { "" } else { "s" },
    )
}

/// A short preventive recommendation for the dominant crime type.
const fn prevention_advice(crime_type: CrimeType) -> &'static str {
    match crime_type {
        CrimeType::Theft => {
            "keep valuables out of sight and lock bicycles to fixed racks in busy spots."
        }
        CrimeType::Burglary => {
            "check door and window locks, add lighting at entry points, and report \
             suspicious activity around unoccupied homes."
        }
        CrimeType::Assault => {
            "increase visible patrols and lighting where people gather after dark."
        }
        CrimeType::Vandalism => {
            "repair damage quickly and consider cameras at repeatedly targeted sites."
        }
        CrimeType::Fraud => {
            "warn residents about current scams and encourage them to verify unexpected \
             payment requests."
        }
        CrimeType::DrugRelated => {
            "coordinate with outreach services and monitor abandoned buildings."
        }
        CrimeType::VehicleCrime => {
            "remind drivers to lock vehicles and remove valuables, especially in open lots."
        }
        CrimeType::Cybercrime => {
            "promote strong passwords and two-factor authentication among residents and \
             businesses."
        }
        CrimeType::DomesticViolence => {
            "publicize support hotlines and shelters and make sure responders can refer \
             victims quickly."
        }
        CrimeType::Other => "keep monitoring new reports to identify an emerging pattern.",
    }
}
