//! Configuration: data directory and logging settings.
//!
//! Resolution order is defaults, then an optional TOML file, then environment
//! variables (`CLAUDE_HOME`, `LOG_LEVEL`, `LOG_FORMAT`).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter; RUST_LOG still wins when set.
    pub level: String,
    /// "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory containing the `projects/` usage tree.
    pub claude_home: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            claude_home: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".claude"),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let candidates = [
            PathBuf::from("claude-spend.toml"),
            PathBuf::from(".claude-spend.toml"),
            dirs::config_dir()
                .map(|dir| dir.join("claude-spend").join("config.toml"))
                .unwrap_or_default(),
        ];
        for path in &candidates {
            if path.is_file() {
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("CLAUDE_HOME") {
            self.paths.claude_home = PathBuf::from(val);
        }
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| Config::load().expect("failed to load configuration"))
}

/// Remediation text for the one fatal scan condition: no usage tree at all.
pub fn missing_data_help(claude_home: &Path) -> String {
    format!(
        "No Claude Code usage data found.\n\
         \n\
         Looked for: {}\n\
         \n\
         To fix this:\n\
         1. Run Claude Code at least once on this machine; session logs are\n\
            written under ~/.claude/projects/ as you work.\n\
         2. If your logs live somewhere else, set CLAUDE_HOME to the directory\n\
            that contains the projects/ folder.\n\
         3. Or set paths.claude_home in claude-spend.toml.",
        claude_home.join("projects").display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "pretty");
        assert!(config.paths.claude_home.ends_with(".claude"));
    }

    #[test]
    fn env_overrides() {
        env::set_var("CLAUDE_HOME", "/tmp/claude-spend-test");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.paths.claude_home, PathBuf::from("/tmp/claude-spend-test"));
        env::remove_var("CLAUDE_HOME");
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let config: Config = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn missing_data_help_names_the_path() {
        let help = missing_data_help(Path::new("/nonexistent/.claude"));
        assert!(help.contains("/nonexistent/.claude/projects"));
        assert!(help.contains("CLAUDE_HOME"));
    }
}
