//! Tracing setup. The TUI owns the terminal, so it logs to a file;
//! headless commands log to stderr.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Commands;

/// Where a command's log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
}

impl LogTarget {
    /// `show` logs to a file (default under the cache dir); everything else to stderr
    pub fn for_command(command: &Commands) -> Self {
        match command {
            Commands::Show { log_file, .. } => {
                LogTarget::File(log_file.clone().unwrap_or_else(default_log_path))
            }
            _ => LogTarget::Stderr,
        }
    }

    /// Install the global subscriber. Call once, before anything logs.
    pub fn init(&self, verbose: bool) -> Result<()> {
        match self {
            LogTarget::File(path) => init_file_logger(path, verbose),
            LogTarget::Stderr => {
                init_cli_logger(verbose);
                Ok(())
            }
        }
    }
}

fn filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "auto_analyst=debug"
    } else {
        "auto_analyst=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Default log file under the user cache directory
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("auto-analyst")
        .join("auto-analyst.log")
}

fn init_file_logger(path: &Path, verbose: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {parent:?}"))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {path:?}"))?;

    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_target_follows_command() {
        let show = Cli::try_parse_from(["auto-analyst", "show", "--log-file", "run.log"]).unwrap();
        assert_eq!(
            LogTarget::for_command(&show.command),
            LogTarget::File(PathBuf::from("run.log"))
        );

        let show = Cli::try_parse_from(["auto-analyst", "show"]).unwrap();
        assert_eq!(LogTarget::for_command(&show.command), LogTarget::File(default_log_path()));

        let clean = Cli::try_parse_from(["auto-analyst", "clean", "data.csv"]).unwrap();
        assert_eq!(LogTarget::for_command(&clean.command), LogTarget::Stderr);
    }
}
