use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use db_manager::Backend;
use tracing::Level;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Walk through the db-manager API against a configured database")]
pub(crate) struct Args {
    /// Configuration file (TOML, YAML, JSON or INI)
    #[arg(long, default_value = "db.toml")]
    pub(crate) config: PathBuf,
    /// Backend to use instead of `default.database`
    #[arg(long, value_enum)]
    pub(crate) backend: Option<Backend>,
    #[arg(long, value_enum, default_value = "info")]
    pub(crate) log_level: LogLevel,
    /// Also append log lines to this file
    #[arg(long)]
    pub(crate) log: Option<PathBuf>,
}
