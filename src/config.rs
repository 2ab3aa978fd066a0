//! Optional TOML configuration file.
//!
//! Looked up from `--config`, then `AUTO_ANALYST_CONFIG`, then
//! `<config dir>/auto-analyst/config.toml`. Values here sit below command-line
//! flags and environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{AnalystError, Result};

pub const CONFIG_ENV: &str = "AUTO_ANALYST_CONFIG";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub preview_rows: Option<usize>,
    pub output_dir: Option<PathBuf>,
    pub clean_on_load: Option<bool>,
    pub llm: LlmFileConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LlmFileConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

impl FileConfig {
    /// Load from an explicit path, or from the default location if one exists
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(FileConfig::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalystError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let config = Self::parse(&text).map_err(|e| AnalystError::Config {
            message: format!("{}: {e}", path.display()),
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("auto-analyst").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_file() {
        let config = FileConfig::parse(
            r#"
preview_rows = 10
output_dir = "out"
clean_on_load = true

[llm]
api_key = "k"
model = "llama-3.3-70b-versatile"
temperature = 0.2
"#,
        )
        .unwrap();
        assert_eq!(config.preview_rows, Some(10));
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
        assert_eq!(config.clean_on_load, Some(true));
        assert_eq!(config.llm.api_key.as_deref(), Some("k"));
        assert_eq!(config.llm.api_base, None);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(FileConfig::parse("colour = \"red\"").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = FileConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, AnalystError::Config { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "preview_rows = 3").unwrap();
        let config = FileConfig::from_file(file.path()).unwrap();
        assert_eq!(config.preview_rows, Some(3));
    }
}
