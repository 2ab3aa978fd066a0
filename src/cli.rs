//! Command-line interface argument parsing for auto-analyst.
//!
//! - `auto-analyst show sales.xlsx` opens the dashboard
//! - `auto-analyst summary sales.csv --clean`
//! - `auto-analyst clean sales.csv -o tidy.csv`
//! - `auto-analyst ask sales.csv "top 5 regions by revenue"`

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::chat::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::config::FileConfig;
use crate::data::export::DEFAULT_EXPORT_NAME;

/// Rows shown in data previews unless configured otherwise
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Load a CSV or Excel file, clean it, and explore it from the terminal.
#[derive(Parser, Debug)]
#[command(name = "auto-analyst")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive dashboard
    Show {
        /// CSV or XLSX file to open
        file: Option<PathBuf>,

        /// Start with auto-cleaning enabled
        #[arg(long)]
        clean: bool,

        /// Rows shown in data previews
        #[arg(long)]
        preview_rows: Option<usize>,

        /// Directory the cleaned CSV is written to
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Log file (defaults to the user cache directory)
        #[arg(long)]
        log_file: Option<PathBuf>,

        #[command(flatten)]
        llm: LlmArgs,
    },
    /// Print an overview, column profile and KPIs
    Summary {
        file: PathBuf,

        /// Apply auto-cleaning first
        #[arg(long)]
        clean: bool,

        /// Column used for the KPIs (defaults to the first numeric column)
        #[arg(short, long)]
        metric: Option<String>,
    },
    /// Write the auto-cleaned data as CSV
    Clean {
        file: PathBuf,

        /// Output path (defaults to cleaned_data.csv in the configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Ask one question about the data
    Ask {
        file: PathBuf,

        question: String,

        /// Apply auto-cleaning first
        #[arg(long)]
        clean: bool,

        #[command(flatten)]
        llm: LlmArgs,
    },
}

/// Language model options shared by `show` and `ask`
#[derive(Args, Debug, Clone, Default)]
pub struct LlmArgs {
    /// API key for the chat completion service
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name
    #[arg(long)]
    pub model: Option<String>,

    /// OpenAI-compatible API base URL
    #[arg(long)]
    pub api_base: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Resolved language model settings
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub temperature: Option<f32>,
}

impl LlmSettings {
    /// Flags and environment win over the config file
    pub fn resolve(args: LlmArgs, file: &FileConfig) -> Self {
        LlmSettings {
            api_key: args
                .api_key
                .filter(|k| !k.trim().is_empty())
                .or_else(|| file.llm.api_key.clone()),
            api_base: args
                .api_base
                .or_else(|| file.llm.api_base.clone())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: args
                .model
                .or_else(|| file.llm.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: file.llm.temperature,
        }
    }
}

/// `--clean`, or the config file's `clean_on_load`
pub fn resolve_clean(flag: bool, file_config: &FileConfig) -> bool {
    flag || file_config.clean_on_load.unwrap_or(false)
}

/// Where `clean` writes: `-o`, else the configured output directory, else the working directory
pub fn resolve_export_path(output: Option<PathBuf>, file_config: &FileConfig) -> PathBuf {
    output.unwrap_or_else(|| match &file_config.output_dir {
        Some(dir) => dir.join(DEFAULT_EXPORT_NAME),
        None => PathBuf::from(DEFAULT_EXPORT_NAME),
    })
}

/// Configuration for the interactive dashboard
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub file: Option<PathBuf>,
    pub clean_on_load: bool,
    pub preview_rows: usize,
    pub output_dir: PathBuf,
    pub llm: LlmSettings,
}

impl AppConfig {
    /// Create AppConfig from the `show` command and the config file
    pub fn from_show_command(
        file: Option<PathBuf>,
        clean: bool,
        preview_rows: Option<usize>,
        output_dir: Option<PathBuf>,
        llm: LlmArgs,
        file_config: &FileConfig,
    ) -> Self {
        AppConfig {
            file,
            clean_on_load: resolve_clean(clean, file_config),
            preview_rows: preview_rows
                .or(file_config.preview_rows)
                .unwrap_or(DEFAULT_PREVIEW_ROWS)
                .max(1),
            output_dir: output_dir
                .or_else(|| file_config.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(".")),
            llm: LlmSettings::resolve(llm, file_config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::from_show_command(
            None,
            false,
            None,
            None,
            LlmArgs::default(),
            &FileConfig::default(),
        );
        assert_eq!(config.preview_rows, DEFAULT_PREVIEW_ROWS);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(!config.clean_on_load);
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.api_base, DEFAULT_API_BASE);
        assert_eq!(config.llm.api_key, None);
    }

    #[test]
    fn test_flags_override_file() {
        let file = FileConfig::parse(
            "preview_rows = 20\nclean_on_load = true\n[llm]\napi_key = \"from-file\"\nmodel = \"file-model\"\n",
        )
        .unwrap();
        let llm = LlmArgs {
            api_key: Some("from-flag".into()),
            model: None,
            api_base: None,
        };
        let config = AppConfig::from_show_command(None, false, Some(3), None, llm, &file);
        assert_eq!(config.preview_rows, 3);
        assert!(config.clean_on_load);
        assert_eq!(config.llm.api_key.as_deref(), Some("from-flag"));
        assert_eq!(config.llm.model, "file-model");
    }

    #[test]
    fn test_headless_commands_read_config_file() {
        let file = FileConfig::parse("clean_on_load = true\noutput_dir = \"reports\"\n").unwrap();
        assert!(resolve_clean(false, &file));
        assert!(!resolve_clean(false, &FileConfig::default()));
        assert_eq!(
            resolve_export_path(None, &file),
            PathBuf::from("reports").join(DEFAULT_EXPORT_NAME)
        );
        assert_eq!(
            resolve_export_path(Some("tidy.csv".into()), &file),
            PathBuf::from("tidy.csv")
        );
        assert_eq!(
            resolve_export_path(None, &FileConfig::default()),
            PathBuf::from(DEFAULT_EXPORT_NAME)
        );
    }

    #[test]
    fn test_blank_key_falls_back_to_file() {
        let file = FileConfig::parse("[llm]\napi_key = \"k\"\n").unwrap();
        let llm = LlmArgs {
            api_key: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(LlmSettings::resolve(llm, &file).api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_cli_parses_ask() {
        let cli = Cli::try_parse_from(["auto-analyst", "ask", "data.csv", "total sales", "--clean"]).unwrap();
        match cli.command {
            Commands::Ask { file, question, clean, .. } => {
                assert_eq!(file, PathBuf::from("data.csv"));
                assert_eq!(question, "total sales");
                assert!(clean);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
