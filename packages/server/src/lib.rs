#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crime portal.
//!
//! Exposes report submission and listing, statistics, and predictions as
//! JSON under `/api`. All state lives behind a single [`Portal`], opened
//! over the `SQLite` database named by `PORTAL_DB_PATH`.

mod handlers;
pub mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, error, middleware, web};
use crime_portal_facade::Portal;
use crime_portal_server_models::ApiError;

/// Shared application state.
pub struct AppState {
    /// Every portal operation goes through here.
    pub portal: Arc<Portal>,
}

/// Server settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Path of the portal `SQLite` database.
    pub db_path: PathBuf,
    /// Address to bind to.
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
}

impl ServerConfig {
    /// Reads `PORTAL_DB_PATH`, `BIND_ADDR`, and `PORT`, falling back to
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            db_path: lookup("PORTAL_DB_PATH")
                .filter(|p| !p.trim().is_empty())
                .map_or_else(
                    || PathBuf::from(crime_portal_database::DEFAULT_DB_PATH),
                    PathBuf::from,
                ),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
        }
    }
}

/// Registers the `/api` routes and the JSON error shape for rejected
/// request bodies and query strings.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected request body: {err}");
        let response = HttpResponse::BadRequest().json(ApiError::new(&err));
        error::InternalError::from_response(err, response).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        log::debug!("Rejected query string: {err}");
        let response = HttpResponse::BadRequest().json(ApiError::new(&err));
        error::InternalError::from_response(err, response).into()
    }))
    .service(
        web::scope("/api")
            .route("/", web::get().to(handlers::root))
            .route("/health", web::get().to(handlers::health))
            .route("/crime-types", web::get().to(handlers::crime_types))
            .route("/reports", web::post().to(handlers::submit_report))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports/{id}", web::get().to(handlers::get_report))
            .route("/stats", web::get().to(handlers::stats))
            .route("/predict", web::post().to(handlers::predict))
            .route("/predictions", web::get().to(handlers::list_predictions)),
    );
}

/// Starts the crime portal API server configured from the environment.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened or
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    run_server_with(ServerConfig::from_env()).await
}

/// Starts the crime portal API server with explicit settings.
///
/// Opens the portal database, rebuilds the aggregates, and serves until
/// shut down.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened or
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server_with(config: ServerConfig) -> std::io::Result<()> {
    // The CLI may already have installed a logger.
    let _ = pretty_env_logger::try_init_custom_env("RUST_LOG");

    log::info!("Opening portal database at {}...", config.db_path.display());
    let db = crime_portal_database::open_db(&config.db_path)
        .await
        .map_err(std::io::Error::other)?;

    let portal = Portal::open(db).await.map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState {
        portal: Arc::new(portal),
    });

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await
}
