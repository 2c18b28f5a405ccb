// config.rs — CLI configuration from .ccl/config.toml.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".ccl/config.toml";

/// Filter used when neither RUST_LOG nor `[log] filter` is set.
pub const DEFAULT_LOG_FILTER: &str = "ccl_core=warn,ccl=info";

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub evaluate: EvaluateConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluateConfig {
    /// JSON context file used by `ccl eval` when --context is not given.
    #[serde(default)]
    pub context: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// tracing-subscriber EnvFilter directives.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl CliConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Load config, returning defaults if the file doesn't exist. A file that
    /// exists but fails to parse is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = CliConfig::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.log.filter, DEFAULT_LOG_FILTER);
        assert!(config.evaluate.context.is_none());
    }

    #[test]
    fn full_file_is_parsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[output]
format = "json"

[evaluate]
context = "ctx.json"

[log]
filter = "ccl=debug"
"#,
        )
        .unwrap();

        let config = CliConfig::load_or_default(&path).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.evaluate.context, Some(PathBuf::from("ctx.json")));
        assert_eq!(config.log.filter, "ccl=debug");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nformat = \"json\"\n").unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[output]\nformat = \"yaml\"\n").unwrap();

        let err = CliConfig::load_or_default(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }
}
