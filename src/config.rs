//! Configuration: log-root resolution, logging settings, TOML overrides.
//!
//! Resolution order for data directories:
//!
//! 1. `data_dirs` from a config file, used verbatim as scan roots
//! 2. `CLAUDE_CONFIG_DIR` (comma-separated, multi-root)
//! 3. defaults: `$XDG_CONFIG_HOME/claude` (or `~/.config/claude`) and
//!    `~/.claude`
//!
//! Env/default candidates qualify only when their `projects/` subdirectory
//! exists; the `projects/` directory itself is the scan root. Duplicates are
//! removed, first occurrence wins.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

const CLAUDE_CONFIG_DIR_ENV: &str = "CLAUDE_CONFIG_DIR";
const PROJECTS_DIR_NAME: &str = "projects";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset.
    pub level: String,
    /// "pretty" or "json".
    pub format: String,
    /// "console", "file" or "both".
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directories scanned recursively for `*.jsonl`. Empty means
    /// "resolve from environment and defaults at load time".
    pub data_dirs: Vec<PathBuf>,
    pub log_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "warn".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            paths: PathsConfig {
                data_dirs: Vec::new(),
                log_directory: PathBuf::from("logs"),
            },
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("claude-meter.toml"),
            PathBuf::from(".claude-meter.toml"),
            dirs::config_dir()
                .map(|d| d.join("claude-meter").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides();

        if config.paths.data_dirs.is_empty() {
            config.paths.data_dirs = resolve_data_dirs();
        }

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }
        if let Ok(val) = env::var("CLAUDE_METER_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }
    }
}

/// Resolve scan roots from `CLAUDE_CONFIG_DIR` or the default locations.
///
/// An empty result is not an error; the pipeline treats it as "no data".
pub fn resolve_data_dirs() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    let env_value = env::var(CLAUDE_CONFIG_DIR_ENV).unwrap_or_default();
    if !env_value.trim().is_empty() {
        candidates.extend(
            env_value
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        );
    } else {
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("claude"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".claude"));
        }
    }

    qualify_candidates(candidates)
}

/// Keep only candidates with an existing `projects/` subdirectory; that
/// subdirectory is the scan root. Duplicates keep their first occurrence.
fn qualify_candidates(candidates: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut roots = Vec::new();
    for candidate in candidates {
        let projects = candidate.join(PROJECTS_DIR_NAME);
        if projects.is_dir() && seen.insert(projects.clone()) {
            roots.push(projects);
        }
    }

    roots
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Global configuration instance, loaded on first access.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "failed to load configuration, using defaults");
            Config::default()
        }
    })
}
