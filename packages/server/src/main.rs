#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime portal API server binary.
//!
//! Configured through `PORTAL_DB_PATH`, `BIND_ADDR`, `PORT`, and
//! `RUST_LOG`. Pass `--interactive` to be prompted for the settings
//! instead.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if std::env::args().skip(1).any(|arg| arg == "--interactive") {
        crime_portal_server::interactive::run().await
    } else {
        crime_portal_server::run_server().await
    }
}
