//! Plain-text rendering of portal results for the terminal.

use crime_portal_facade::StatsVerification;
use crime_portal_report_models::{CrimeReport, Prediction, StatsSnapshot};

/// Shortens `text` to at most `max` characters, marking the cut with `...`.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Formats a timestamp compactly (to the second, UTC).
fn short_time(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Prints every field of one report, one per line.
pub fn print_report(report: &CrimeReport) {
    println!("ID:          {}", report.id);
    println!("Type:        {}", report.crime_type);
    println!("Area:        {}", report.area);
    println!("Location:    {}", report.location);
    println!("Reported by: {}", report.reported_by);
    println!("Time:        {}", short_time(&report.timestamp));
    println!("Description: {}", report.description);
}

/// Prints reports as a table, one row each, followed by a count.
pub fn print_reports(reports: &[CrimeReport]) {
    if reports.is_empty() {
        println!("No reports found.");
        return;
    }

    println!(
        "{:<38} {:<20} {:<18} {:<20} LOCATION",
        "ID", "TIME", "TYPE", "AREA"
    );
    println!("{}", "-".repeat(110));

    for report in reports {
        println!(
            "{:<38} {:<20} {:<18} {:<20} {}",
            report.id,
            short_time(&report.timestamp),
            report.crime_type.to_string(),
            truncate(&report.area, 20),
            truncate(&report.location, 30)
        );
    }

    println!("\n{} report(s)", reports.len());
}

/// Prints the total followed by per-area and per-type counts.
pub fn print_stats(stats: &StatsSnapshot) {
    println!("Total reports: {}", stats.total_reports);

    if stats.total_reports == 0 {
        return;
    }

    println!("\nBy area:");
    for entry in &stats.by_area {
        println!("  {:<30} {:>6}", truncate(&entry.area, 30), entry.count);
    }

    println!("\nBy type:");
    for entry in &stats.by_type {
        println!("  {:<30} {:>6}", entry.crime_type.to_string(), entry.count);
    }
}

/// Prints whether served statistics match a rescan, and both when they
/// differ.
pub fn print_verification(verification: &StatsVerification) {
    if verification.is_consistent() {
        println!("Aggregates match a full rescan.");
    } else {
        println!("Aggregates DIFFER from a full rescan.");
        println!("\nServed:");
        print_stats(&verification.incremental);
        println!("\nRescanned:");
        print_stats(&verification.rescanned);
    }
}

/// Prints a prediction's header line and its full narrative.
pub fn print_prediction(prediction: &Prediction) {
    println!(
        "Prediction {} ({}, {} confidence)",
        prediction.id,
        prediction.area.as_deref().unwrap_or("all areas"),
        prediction.confidence
    );
    println!("{}", "-".repeat(60));
    println!("{}", prediction.prediction_text);
}

/// Prints predictions as a table, one row each, followed by a count.
pub fn print_predictions(predictions: &[Prediction]) {
    if predictions.is_empty() {
        println!("No predictions found.");
        return;
    }

    println!(
        "{:<38} {:<20} {:<10} {:<20} INSIGHTS",
        "ID", "TIME", "CONF", "AREA"
    );
    println!("{}", "-".repeat(110));

    for prediction in predictions {
        println!(
            "{:<38} {:<20} {:<10} {:<20} {}",
            prediction.id,
            short_time(&prediction.timestamp),
            prediction.confidence.to_string(),
            truncate(prediction.area.as_deref().unwrap_or("(all)"), 20),
            truncate(&prediction.insights.join("; "), 40)
        );
    }

    println!("\n{} prediction(s)", predictions.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("Downtown", 20), "Downtown");
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn truncate_cuts_on_char_boundaries() {
        assert_eq!(truncate("Río Grande Boulevard", 10), "Río Gra...");
        assert_eq!(truncate("abcdef", 3), "...");
    }
}
