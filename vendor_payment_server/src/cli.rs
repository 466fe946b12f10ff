use std::{env, env::VarError};

use log::*;
use vendor_payment_engine::{MaintenanceApi, PaymentGatewayDatabase, SqliteDatabase};

use crate::{config::ServerConfig, errors::ServerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliCommand {
    Serve,
    Purge,
    Help,
}

impl CliCommand {
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Self {
        let args = args.into_iter().skip(1).collect::<Vec<_>>();
        match args.as_slice() {
            [] => CliCommand::Serve,
            [arg] if arg == "--purge" => CliCommand::Purge,
            _ => CliCommand::Help,
        }
    }
}

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> CliCommand {
    let command = CliCommand::from_args(env::args());
    if command == CliCommand::Help {
        display_readme();
        display_envs();
    }
    command
}

/// Irreversibly deletes every transaction, every vendor setting and all payment metadata on orders.
pub async fn purge(config: &ServerConfig) -> Result<(), ServerError> {
    let mut db = SqliteDatabase::new_with_url(&config.database_url, 1)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let summary = MaintenanceApi::new(db.clone())
        .purge_all()
        .await
        .map_err(|e| ServerError::BackendError(e.to_string()))?;
    println!(
        "Removed {} transactions, {} settings rows and {} order metadata entries.",
        summary.transactions, summary.vendor_settings, summary.order_meta
    );
    if let Err(e) = db.close().await {
        warn!("🚀️ Could not close the database cleanly. {e}");
    }
    Ok(())
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 9] = [
        "RUST_LOG",
        "VPG_HOST",
        "VPG_PORT",
        "VPG_DATABASE_URL",
        "VPG_MAX_DB_CONNECTIONS",
        "VPG_NONCE_LIFETIME_HOURS",
        "VPG_RECEIPT_DIR",
        "VPG_RECEIPT_BASE_URL",
        "VPG_FALLBACK_VENDOR_ID",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
