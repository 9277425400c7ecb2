mod cli;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use shelf_catalog::{Database, IN_MEMORY};
use shelf_config::{Config, LogConfig};
use shelf_web::{AppState, Views};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            // No subscriber yet: the log settings live in the configuration.
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        },
    };
    init_tracing(&config.log);
    match run(cli.command.unwrap_or_default(), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "{}", *err);
            ExitCode::FAILURE
        },
    }
}

/// Logs go to stderr so `shelf config` output stays clean. `RUST_LOG`, when
/// set, replaces the configured filter.
fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    if config.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).with_writer(std::io::stderr).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
    }
}

async fn run(command: Command, mut config: Config) -> Result<()> {
    match command {
        Command::Config => {
            let json = serde_json::to_string_pretty(&config).or_raise(|| ErrorKind::Config)?;
            println!("{json}");
        },
        Command::Migrate => {
            let db = open(&config).await?;
            tracing::info!("database schema is up to date");
            db.close().await;
        },
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
                config.validate().or_raise(|| ErrorKind::Config)?;
            }
            let views = Views::load().or_raise(|| ErrorKind::Server)?;
            let db = open(&config).await?;
            let state = AppState::new(db.clone(), views, config.catalog.page_size);
            let served = shelf_web::serve(&config.server, state).await.or_raise(|| ErrorKind::Server);
            db.close().await;
            served?;
        },
    }
    Ok(())
}

async fn open(config: &Config) -> Result<Database> {
    let path = &config.database.path;
    if path != Path::new(IN_MEMORY)
        && let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Database)?;
    }
    Database::connect_with(path, config.database.max_connections).await.or_raise(|| ErrorKind::Database)
}
