//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$REPLYSPLIT_CONFIG` (environment variable)
//! 2. `~/.config/replysplit/config.toml` (Linux/macOS)
//!    `%APPDATA%\replysplit\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Column names in the exported CSV.
    pub columns: ColumnsConfig,
    /// Row normalization rules.
    pub ingest: IngestConfig,
    /// Export defaults.
    pub export: ExportConfig,
    /// Case submission settings.
    pub submit: SubmitConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Header names of the columns we read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    /// Contact display name.
    pub name: String,
    /// Contact address (required).
    pub address: String,
    /// Thread subject.
    pub subject: String,
    /// Raw message body (required).
    pub body: String,
}

/// Row normalization rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Addresses starting with this prefix (case-insensitive) are internal
    /// directory identifiers and get resolved from the body text.
    pub exchange_prefix: String,
    /// Used when a directory identifier cannot be resolved.
    pub exchange_fallback: String,
    /// Subject for rows that have none.
    pub default_subject: String,
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Default export format: "csv", "txt", "json".
    pub default_format: String,
    /// Default output directory.
    pub default_output_dir: Option<PathBuf>,
}

/// Case submission settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitConfig {
    /// Intake method recorded on every case.
    pub intake_method: String,
    /// File name of the submission queue inside the output directory.
    pub queue_file: String,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            name: "To: (Name)".to_string(),
            address: "To: (Address)".to_string(),
            subject: "Subject".to_string(),
            body: "Body".to_string(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            exchange_prefix: "/o=nycc/ou=exchange".to_string(),
            exchange_fallback: "/o=NYCC/ou=Exchange Administrative".to_string(),
            default_subject: "No Subject".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: "csv".to_string(),
            default_output_dir: None,
        }
    }
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            intake_method: "Emailed".to_string(),
            queue_file: "submission_queue.jsonl".to_string(),
        }
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<()> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("REPLYSPLIT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("replysplit").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("replysplit")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("replysplit.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.columns.address, "To: (Address)");
        assert_eq!(cfg.ingest.default_subject, "No Subject");
        assert_eq!(cfg.export.default_format, "csv");
        assert_eq!(cfg.submit.intake_method, "Emailed");
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.columns.body, cfg.columns.body);
        assert_eq!(parsed.ingest.exchange_prefix, cfg.ingest.exchange_prefix);
        assert_eq!(parsed.submit.queue_file, cfg.submit.queue_file);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[columns]
body = "Message Body"

[ingest]
default_subject = "(none)"
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.columns.body, "Message Body");
        assert_eq!(cfg.ingest.default_subject, "(none)");
        // Other fields use defaults
        assert_eq!(cfg.columns.name, "To: (Name)");
        assert_eq!(cfg.general.log_level, "warn");
    }

    #[test]
    fn test_cache_dir_override() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/replysplit-logs"));
        assert_eq!(
            log_file_path(&cfg),
            PathBuf::from("/tmp/replysplit-logs/replysplit.log")
        );
    }
}
