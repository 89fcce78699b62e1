//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::constants::{ENV_API_KEY, ENV_CONFIG, ENV_DB_PATH, ENV_HOST, ENV_PORT};

#[derive(Parser)]
#[command(name = "threadtrace")]
#[command(version, about = "Trace ingestion server for agent chat telemetry", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database file
    #[arg(long, global = true, env = ENV_DB_PATH)]
    pub db_path: Option<PathBuf>,

    /// Require this bearer key on all API requests
    #[arg(long, global = true, env = ENV_API_KEY)]
    pub api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server (default)
    Start,
}

/// CLI-provided overrides passed into config loading
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub db_path: Option<PathBuf>,
    pub api_key: Option<String>,
}

/// Parse command-line arguments
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    (
        CliConfig {
            host: cli.host,
            port: cli.port,
            config: cli.config,
            db_path: cli.db_path,
            api_key: cli.api_key,
        },
        cli.command,
    )
}
