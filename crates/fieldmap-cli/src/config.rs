//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - Environment variables (`FIELDMAP_*`)

use crate::error::{Error, Result};
use fieldmap_core::benchmark::{DEFAULT_ITERATIONS, DEFAULT_SAMPLE_COUNT};
use fieldmap_core::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use fieldmap_core::CacheSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transformation cache settings
    pub cache: CacheConfig,

    /// Benchmark defaults
    pub benchmark: BenchmarkDefaults,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached results
    pub capacity: usize,

    /// Entry lifetime in seconds
    pub ttl_secs: u64,

    /// Whether lookups and stores are performed at all
    pub enabled: bool,
}

/// Benchmark defaults used when the command line does not override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkDefaults {
    pub iterations: usize,
    pub sample_count: usize,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, full, json)
    pub format: String,

    /// Log file path
    pub file: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl_secs: DEFAULT_TTL.as_secs(),
            enabled: true,
        }
    }
}

impl Default for BenchmarkDefaults {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            sample_count: DEFAULT_SAMPLE_COUNT,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            progress: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            file: None,
        }
    }
}

/// Serialization format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Yaml,
    Toml,
    Json,
}

impl FileFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::from_path(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid TOML in {}: {}", path.display(), e)))?,
            FileFormat::Json => serde_json::from_str(&content)?,
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load from a specific file or default locations, then apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".fieldmap.yaml"),
            PathBuf::from(".fieldmap.yml"),
            PathBuf::from(".fieldmap.json"),
            PathBuf::from(".fieldmap.toml"),
        ];

        if let Some(user_path) = Self::user_config_path() {
            paths.push(user_path);
        }

        paths
    }

    /// Path of the user configuration file
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("fieldmap").join("config.toml"))
    }

    /// Apply `FIELDMAP_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("FIELDMAP_CACHE_CAPACITY") {
            self.cache.capacity = parse_env("FIELDMAP_CACHE_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("FIELDMAP_CACHE_TTL_SECS") {
            self.cache.ttl_secs = parse_env("FIELDMAP_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = lookup("FIELDMAP_CACHE_ENABLED") {
            self.cache.enabled = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(value) = lookup("FIELDMAP_BENCH_ITERATIONS") {
            self.benchmark.iterations = parse_env("FIELDMAP_BENCH_ITERATIONS", &value)?;
        }
        if let Some(value) = lookup("FIELDMAP_BENCH_SAMPLES") {
            self.benchmark.sample_count = parse_env("FIELDMAP_BENCH_SAMPLES", &value)?;
        }
        if let Some(value) = lookup("FIELDMAP_LOG_LEVEL") {
            self.logging.level = value;
        }
        Ok(())
    }

    /// Reject values the core would refuse later with a less helpful message
    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            return Err(Error::config("cache.capacity must be at least 1"));
        }
        if self.benchmark.iterations == 0 {
            return Err(Error::config("benchmark.iterations must be at least 1"));
        }
        Ok(())
    }

    /// Cache settings for the core cache
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            capacity: self.cache.capacity,
            ttl: Duration::from_secs(self.cache.ttl_secs),
            enabled: self.cache.enabled,
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.render(FileFormat::from_path(path))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        self.render(FileFormat::Toml)
    }

    fn render(&self, format: FileFormat) -> Result<String> {
        Ok(match format {
            FileFormat::Yaml => serde_yaml::to_string(self)?,
            FileFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e)))?,
            FileFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{} has an invalid value: '{}'", name, value)))
}
