// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use haven::config::Settings;
use haven::error::LedgerError;
use haven::ingest::schemas::SchemaRegistry;
use haven::models::ErrorResponse;
use haven::{cli, commands, db};

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(settings: &Settings) -> Result<()> {
    let registry = SchemaRegistry::builtin()?;
    let matches = cli::build_cli(&registry.names()).get_matches();

    let mut conn = db::open_or_init(settings)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path(settings)?.display());
        }
        Some(("account", sub)) => commands::accounts::handle(&mut conn, sub)?,
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, settings, sub)?,
        Some(("import", sub)) => commands::importer::handle(&mut conn, &registry, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, settings, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&conn, sub)?,
        _ => {
            cli::build_cli(&registry.names()).print_help()?;
            println!();
        }
    }
    Ok(())
}

fn main() {
    let settings = match Settings::load() {
        Ok(s) => s,
        Err(err) => {
            init_tracing("info");
            fail(err);
        }
    };
    init_tracing(&settings.log_level);

    if let Err(err) = run(&settings) {
        fail(err);
    }
}

fn fail(err: anyhow::Error) -> ! {
    let client_error = err
        .downcast_ref::<LedgerError>()
        .is_some_and(LedgerError::is_client_error);
    if client_error {
        tracing::warn!(error = %format!("{:#}", err), "request rejected");
    } else {
        tracing::error!(error = %format!("{:#}", err), "command failed");
    }
    let body = ErrorResponse::from(&err);
    match serde_json::to_string(&body) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}", body.message),
    }
    std::process::exit(1);
}
