#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Operator CLI for the crime portal.
//!
//! ```text
//! crime_portal submit --type Burglary --area Downtown --location "5th Ave" --description "..."
//! crime_portal reports [--limit 20] [--area down] [--type Theft]
//! crime_portal stats [--verify]
//! crime_portal predict [--area Downtown]
//! crime_portal predictions [--limit 10] [--area down]
//! crime_portal serve
//! ```
//!
//! Every command accepts `--db <path>`, defaulting to `PORTAL_DB_PATH` and
//! then `data/portal.db`. Running `crime_portal` with no subcommand enters
//! interactive mode.

mod display;
mod interactive;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use crime_portal_facade::Portal;
use crime_portal_report_models::{CrimeType, NewCrimeReport, ReportFilter, ValidationError};
use crime_portal_server::ServerConfig;

#[derive(Parser)]
#[command(
    name = "crime_portal",
    about = "Submit crime reports, inspect statistics, and generate predictions"
)]
struct Cli {
    /// Path to the portal database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new crime report
    Submit {
        /// Crime type (e.g. "Theft", "Vehicle Crime")
        #[arg(long = "type")]
        crime_type: String,
        /// Area the crime happened in
        #[arg(long)]
        area: String,
        /// Specific address or place
        #[arg(long)]
        location: String,
        /// What happened
        #[arg(long)]
        description: String,
        /// Reporter name (anonymous if omitted)
        #[arg(long)]
        reported_by: Option<String>,
    },
    /// List recent reports, newest first
    Reports {
        /// Maximum number of reports to show
        #[arg(long, default_value = "20")]
        limit: u32,
        /// Only reports whose area contains this text
        #[arg(long)]
        area: Option<String>,
        /// Only reports of this crime type
        #[arg(long = "type")]
        crime_type: Option<String>,
    },
    /// Show report counts by area and type
    Stats {
        /// Also compare the counts against a full rescan
        #[arg(long)]
        verify: bool,
    },
    /// Generate and store a prediction
    Predict {
        /// Area to scope the prediction to (all areas if omitted)
        #[arg(long)]
        area: Option<String>,
    },
    /// List stored predictions, newest first
    Predictions {
        /// Maximum number of predictions to show
        #[arg(long, default_value = "10")]
        limit: u32,
        /// Only predictions whose area contains this text
        #[arg(long)]
        area: Option<String>,
    },
    /// Start the HTTP API server
    Serve,
}

/// Picks the database path: `--db`, then `PORTAL_DB_PATH`, then the default.
fn resolve_db_path(flag: Option<PathBuf>, env: Option<String>) -> PathBuf {
    flag.or_else(|| env.filter(|p| !p.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(crime_portal_database::DEFAULT_DB_PATH))
}

fn parse_crime_type(label: Option<&str>) -> Result<Option<CrimeType>, ValidationError> {
    label
        .map(|label| {
            label
                .trim()
                .parse::<CrimeType>()
                .map_err(|_| ValidationError::InvalidCrimeType {
                    value: label.to_string(),
                })
        })
        .transpose()
}

async fn open_portal(path: &Path) -> Result<Portal, Box<dyn std::error::Error>> {
    let db = crime_portal_database::open_db(path).await?;
    Ok(Portal::open(db).await?)
}

/// Runs the API server on its own actix system, using `db_path` for
/// storage and the environment for everything else.
async fn serve(db_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig {
        db_path,
        ..ServerConfig::from_env()
    };

    // The server uses actix-web's runtime, so we need to run it
    // in a blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_rt::System::new().block_on(crime_portal_server::run_server_with(config))
    })
    .await??;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let db_path = resolve_db_path(cli.db, std::env::var("PORTAL_DB_PATH").ok());

    let Some(command) = cli.command else {
        return interactive::run(db_path).await;
    };

    let portal = || open_portal(&db_path);

    match command {
        Commands::Submit {
            crime_type,
            area,
            location,
            description,
            reported_by,
        } => {
            let report = portal()
                .await?
                .submit_report(&NewCrimeReport {
                    crime_type,
                    area,
                    location,
                    description,
                    reported_by,
                })
                .await?;
            println!("Report submitted.\n");
            display::print_report(&report);
        }
        Commands::Reports {
            limit,
            area,
            crime_type,
        } => {
            let filter = ReportFilter {
                area,
                crime_type: parse_crime_type(crime_type.as_deref())?,
            };
            let reports = portal().await?.list_reports(Some(limit), &filter).await?;
            display::print_reports(&reports);
        }
        Commands::Stats { verify } => {
            let portal = portal().await?;
            display::print_stats(&portal.stats().await);
            if verify {
                println!();
                display::print_verification(&portal.verify_stats().await?);
            }
        }
        Commands::Predict { area } => {
            let prediction = portal()
                .await?
                .generate_prediction(area.as_deref())
                .await?;
            display::print_prediction(&prediction);
        }
        Commands::Predictions { limit, area } => {
            let predictions = portal()
                .await?
                .list_predictions(Some(limit), area.as_deref())
                .await?;
            display::print_predictions(&predictions);
        }
        Commands::Serve => serve(db_path.clone()).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_path_prefers_flag_then_env() {
        assert_eq!(
            resolve_db_path(Some(PathBuf::from("a.db")), Some("b.db".to_string())),
            PathBuf::from("a.db")
        );
        assert_eq!(
            resolve_db_path(None, Some("b.db".to_string())),
            PathBuf::from("b.db")
        );
        assert_eq!(
            resolve_db_path(None, Some("  ".to_string())),
            PathBuf::from("data/portal.db")
        );
        assert_eq!(resolve_db_path(None, None), PathBuf::from("data/portal.db"));
    }

    #[test]
    fn submit_arguments_parse() {
        let cli = Cli::try_parse_from([
            "crime_portal",
            "--db",
            "/tmp/x.db",
            "submit",
            "--type",
            "Burglary",
            "--area",
            "Downtown",
            "--location",
            "5th Ave",
            "--description",
            "Window broken",
            "--reported-by",
            "Jane",
        ])
        .unwrap();

        assert_eq!(cli.db, Some(PathBuf::from("/tmp/x.db")));
        match cli.command {
            Some(Commands::Submit {
                crime_type,
                reported_by,
                ..
            }) => {
                assert_eq!(crime_type, "Burglary");
                assert_eq!(reported_by.as_deref(), Some("Jane"));
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn stats_verify_and_defaults_parse() {
        let cli = Cli::try_parse_from(["crime_portal", "stats", "--verify"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Stats { verify: true })));

        let cli = Cli::try_parse_from(["crime_portal", "predictions"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Predictions {
                limit: 10,
                area: None
            })
        ));

        let cli = Cli::try_parse_from(["crime_portal"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn crime_type_filter_is_validated() {
        assert_eq!(parse_crime_type(None), Ok(None));
        assert_eq!(
            parse_crime_type(Some(" drug-related ")),
            Ok(Some(CrimeType::DrugRelated))
        );
        assert!(matches!(
            parse_crime_type(Some("Loitering")),
            Err(ValidationError::InvalidCrimeType { .. })
        ));
    }
}
