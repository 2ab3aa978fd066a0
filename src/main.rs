//! auto-analyst: a terminal data analyst for CSV and Excel files
//!
//! Upload a spreadsheet, clean it automatically, and explore it through a KPI
//! dashboard, custom charts with narrative insights, and plain-language
//! questions answered by a language model.

mod analysis;
mod app;
mod chat;
mod cli;
mod commands;
mod config;
mod data;
mod error;
mod logging;
mod report;
mod ui;

use anyhow::{Context, Result};
use cli::{resolve_clean, resolve_export_path, AppConfig, Cli, Commands, LlmSettings, DEFAULT_PREVIEW_ROWS};
use config::FileConfig;
use logging::LogTarget;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Logging comes first so config loading is traced too
    LogTarget::for_command(&cli.command).init(cli.verbose)?;
    let file_config = FileConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Show {
            file,
            clean,
            preview_rows,
            output_dir,
            log_file: _,
            llm,
        } => {
            let config = AppConfig::from_show_command(file, clean, preview_rows, output_dir, llm, &file_config);

            // Run the TUI application
            app::run(config)?;
        }
        Commands::Summary { file, clean, metric } => {
            let preview_rows = file_config.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS).max(1);
            let clean = resolve_clean(clean, &file_config);
            commands::run_summary(&mut std::io::stdout(), &file, clean, metric, preview_rows)?;
        }
        Commands::Clean { file, output } => {
            let output = resolve_export_path(output, &file_config);
            commands::run_clean(&mut std::io::stdout(), &file, &output)?;
        }
        Commands::Ask {
            file,
            question,
            clean,
            llm,
        } => {
            let settings = LlmSettings::resolve(llm, &file_config);
            let clean = resolve_clean(clean, &file_config);
            commands::run_ask(&mut std::io::stdout(), &file, &question, clean, &settings)?;
        }
    }

    Ok(())
}
