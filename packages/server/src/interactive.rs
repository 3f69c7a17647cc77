//! Interactive mode for the server.
//!
//! Prompts the user for the database path, bind address, and port before
//! starting the server.

use dialoguer::{Confirm, Input};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Sets `PORTAL_DB_PATH`, `BIND_ADDR`, and `PORT` from the answers and
/// delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Crime Portal Server");
    println!();

    let current = super::ServerConfig::from_env();

    let db_path: String = Input::new()
        .with_prompt("Database path")
        .default(current.db_path.display().to_string())
        .interact_text()
        .unwrap_or_else(|_| current.db_path.display().to_string());

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(current.bind_addr.clone())
        .interact_text()
        .unwrap_or(current.bind_addr);

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default(current.port.to_string())
        .interact_text()
        .unwrap_or_else(|_| current.port.to_string());

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("PORTAL_DB_PATH", &db_path);
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port_str} using {db_path}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
