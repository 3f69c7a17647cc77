//! Interactive menu for the crime portal CLI.
//!
//! Provides a menu-driven interface over the same operations as the
//! subcommands, using `dialoguer` prompts.

use std::path::PathBuf;

use crime_portal_facade::Portal;
use crime_portal_report_models::{NewCrimeReport, ReportFilter};
use dialoguer::{Confirm, Input, Select};

use crate::display;

/// Top-level actions in the interactive menu.
enum Action {
    Submit,
    Reports,
    Stats,
    Predict,
    Predictions,
    Serve,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Submit,
        Self::Reports,
        Self::Stats,
        Self::Predict,
        Self::Predictions,
        Self::Serve,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Submit => "Submit a crime report",
            Self::Reports => "List recent reports",
            Self::Stats => "Show statistics",
            Self::Predict => "Generate a prediction",
            Self::Predictions => "List predictions",
            Self::Serve => "Start server",
        }
    }
}

/// Runs the interactive menu against the database at `db_path`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, a prompt fails, or
/// the selected operation fails.
pub async fn run(db_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("Crime Portal");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let portal = || crate::open_portal(&db_path);

    match Action::ALL[idx] {
        Action::Submit => handle_submit(&portal().await?).await?,
        Action::Reports => handle_reports(&portal().await?).await?,
        Action::Stats => handle_stats(&portal().await?).await?,
        Action::Predict => handle_predict(&portal().await?).await?,
        Action::Predictions => handle_predictions(&portal().await?).await?,
        Action::Serve => crate::serve(db_path.clone()).await?,
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Prompts for every report field and submits the report.
async fn handle_submit(portal: &Portal) -> Result<(), Box<dyn std::error::Error>> {
    let types = Portal::crime_types();
    let type_labels: Vec<String> = types.iter().map(ToString::to_string).collect();

    let type_idx = Select::new()
        .with_prompt("Crime type")
        .items(&type_labels)
        .default(0)
        .interact()?;

    let area: String = Input::new().with_prompt("Area").interact_text()?;
    let location: String = Input::new().with_prompt("Location").interact_text()?;
    let description: String = Input::new().with_prompt("Description").interact_text()?;
    let reported_by: String = Input::new()
        .with_prompt("Your name (blank for anonymous)")
        .allow_empty(true)
        .interact_text()?;

    let report = portal
        .submit_report(&NewCrimeReport {
            crime_type: type_labels[type_idx].clone(),
            area,
            location,
            description,
            reported_by: Some(reported_by),
        })
        .await?;

    println!("\nReport submitted.\n");
    display::print_report(&report);
    Ok(())
}

/// Lists reports after prompting for a limit and optional filters.
async fn handle_reports(portal: &Portal) -> Result<(), Box<dyn std::error::Error>> {
    let limit = prompt_limit("Max reports to show", 20)?;

    let area: String = Input::new()
        .with_prompt("Area contains (blank for any)")
        .allow_empty(true)
        .interact_text()?;

    let mut type_labels = vec!["Any type".to_string()];
    type_labels.extend(Portal::crime_types().iter().map(ToString::to_string));
    let type_idx = Select::new()
        .with_prompt("Crime type")
        .items(&type_labels)
        .default(0)
        .interact()?;

    let filter = ReportFilter {
        area: Some(area).filter(|a| !a.trim().is_empty()),
        crime_type: type_idx
            .checked_sub(1)
            .map(|i| Portal::crime_types()[i]),
    };

    let reports = portal.list_reports(Some(limit), &filter).await?;
    println!();
    display::print_reports(&reports);
    Ok(())
}

/// Shows statistics, optionally verifying them against a rescan.
async fn handle_stats(portal: &Portal) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    display::print_stats(&portal.stats().await);

    if Confirm::new()
        .with_prompt("Verify against a full rescan?")
        .default(false)
        .interact()?
    {
        println!();
        display::print_verification(&portal.verify_stats().await?);
    }
    Ok(())
}

/// Generates a prediction for a chosen area, or for all areas.
async fn handle_predict(portal: &Portal) -> Result<(), Box<dyn std::error::Error>> {
    let stats = portal.stats().await;

    let mut scopes = vec!["All areas".to_string()];
    scopes.extend(stats.by_area.iter().map(|a| format!("{} ({})", a.area, a.count)));

    let idx = Select::new()
        .with_prompt("Scope")
        .items(&scopes)
        .default(0)
        .interact()?;

    let area = idx
        .checked_sub(1)
        .map(|i| stats.by_area[i].area.as_str());

    let prediction = portal.generate_prediction(area).await?;
    println!();
    display::print_prediction(&prediction);
    Ok(())
}

/// Lists stored predictions after prompting for a limit.
async fn handle_predictions(portal: &Portal) -> Result<(), Box<dyn std::error::Error>> {
    let limit = prompt_limit("Max predictions to show", 10)?;
    let predictions = portal.list_predictions(Some(limit), None).await?;
    println!();
    display::print_predictions(&predictions);
    Ok(())
}

/// Prompts for a positive limit, falling back to `default` on bad input.
fn prompt_limit(prompt: &str, default: u32) -> Result<u32, dialoguer::Error> {
    let text: String = Input::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()?;
    Ok(text.trim().parse().ok().filter(|n| *n > 0).unwrap_or(default))
}
