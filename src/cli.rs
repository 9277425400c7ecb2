use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Library catalog: books, categories and borrowers behind a small web UI.
#[derive(Debug, Parser)]
#[command(name = "shelf", version, about)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON). Defaults to `config.toml` in
    /// the platform configuration directory, when present.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the web server (the default).
    Serve {
        /// Listen address, overriding `server.bind`.
        #[arg(short, long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Create or upgrade the database schema, then exit.
    Migrate,
    /// Print the effective configuration as JSON.
    Config,
}
impl Default for Command {
    fn default() -> Self {
        Self::Serve { bind: None }
    }
}
