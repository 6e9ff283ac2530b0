//! Dashboard configuration
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments
//! 2. Environment variables (`SSA_DASH_*`)
//! 3. TOML bootstrap file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error; the dashboard runs on defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::files::{FilePatterns, SSA_PENDENTES};

pub const ENV_DATA_FILE: &str = "SSA_DASH_DATA_FILE";
pub const ENV_DATA_DIR: &str = "SSA_DASH_DATA_DIR";
pub const ENV_HOST: &str = "SSA_DASH_HOST";
pub const ENV_PORT: &str = "SSA_DASH_PORT";
pub const ENV_RELOAD_INTERVAL: &str = "SSA_DASH_RELOAD_INTERVAL";

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_SSA_LINK: &str =
    "https://osprd.itaipu/SAM_SMA/SSAPublicView.aspx?SerialNumber={numero}&language=pt";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr when unset)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Bootstrap configuration as read from TOML; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Workbook to load; when unset the newest export in `data_dir` is used
    pub data_file: Option<PathBuf>,
    /// Directory searched for portal exports
    pub data_dir: Option<PathBuf>,
    /// Key of the file-name pattern used in `data_dir`
    pub file_pattern: Option<String>,
    /// Extra file-name patterns, key to regex
    pub patterns: std::collections::BTreeMap<String, String>,
    /// Worksheet to read; the first one when unset
    pub sheet: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Seconds between automatic reloads, 0 disables them
    pub reload_interval_secs: Option<u64>,
    /// Portal link for one SSA; `{numero}` is replaced by the SSA number
    pub ssa_link_template: Option<String>,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse `path` if it exists, defaults otherwise
    ///
    /// Silent: it runs before the subscriber is installed, so callers report
    /// the outcome through [`ConfigSource`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match ConfigSource::of(path) {
            ConfigSource::File(p) => Self::load(&p),
            ConfigSource::Missing(_) | ConfigSource::NoConfigDir => Ok(Self::default()),
        }
    }
}

/// Where the TOML layer came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Path given but absent; defaults apply
    Missing(PathBuf),
    NoConfigDir,
}

impl ConfigSource {
    pub fn of(path: Option<&Path>) -> Self {
        match path {
            Some(p) if p.exists() => ConfigSource::File(p.to_path_buf()),
            Some(p) => ConfigSource::Missing(p.to_path_buf()),
            None => ConfigSource::NoConfigDir,
        }
    }
}

/// `<config_dir>/ssa-dash/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ssa-dash").join("config.toml"))
}

/// Where portal exports are searched by default
pub fn default_data_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("./downloads"))
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_file: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Fully resolved dashboard settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardConfig {
    pub data_file: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub file_pattern: String,
    pub patterns: std::collections::BTreeMap<String, String>,
    pub sheet: Option<String>,
    pub host: String,
    pub port: u16,
    pub reload_interval_secs: u64,
    pub ssa_link_template: String,
    pub logging: LoggingConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            data_dir: default_data_dir(),
            file_pattern: SSA_PENDENTES.to_string(),
            patterns: Default::default(),
            sheet: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            reload_interval_secs: DEFAULT_RELOAD_INTERVAL_SECS,
            ssa_link_template: DEFAULT_SSA_LINK.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", name, raw))),
        None => Ok(None),
    }
}

impl DashboardConfig {
    /// Merge CLI overrides, environment and TOML over the defaults
    pub fn resolve(overrides: &ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let data_file = overrides
            .data_file
            .clone()
            .or_else(|| env_var(ENV_DATA_FILE).map(PathBuf::from))
            .or(toml.data_file);
        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| env_var(ENV_DATA_DIR).map(PathBuf::from))
            .or(toml.data_dir)
            .unwrap_or(defaults.data_dir);
        let host = overrides
            .host
            .clone()
            .or_else(|| env_var(ENV_HOST))
            .or(toml.host)
            .unwrap_or(defaults.host);
        let port = match overrides.port {
            Some(port) => port,
            None => env_parse(ENV_PORT)?.or(toml.port).unwrap_or(defaults.port),
        };
        let reload_interval_secs = env_parse(ENV_RELOAD_INTERVAL)?
            .or(toml.reload_interval_secs)
            .unwrap_or(defaults.reload_interval_secs);

        let mut logging = toml.logging;
        if let Some(level) = &overrides.log_level {
            logging.level = level.clone();
        }

        let config = Self {
            data_file,
            data_dir,
            file_pattern: toml.file_pattern.unwrap_or(defaults.file_pattern),
            patterns: toml.patterns,
            sheet: toml.sheet,
            host,
            port,
            reload_interval_secs,
            ssa_link_template: toml.ssa_link_template.unwrap_or(defaults.ssa_link_template),
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::Config("port must be non-zero".to_string()));
        }
        if !self.ssa_link_template.contains("{numero}") {
            return Err(Error::Config(
                "ssa_link_template must contain {numero}".to_string(),
            ));
        }
        Ok(())
    }

    /// Built-in file patterns plus the configured ones
    pub fn file_patterns(&self) -> Result<FilePatterns> {
        let mut patterns = FilePatterns::new()?;
        for (key, regex) in &self.patterns {
            patterns.register(key, regex)?;
        }
        Ok(patterns)
    }

    /// Workbook to load: the configured file, or the newest matching export
    pub fn source_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.data_file {
            return Ok(file.clone());
        }
        self.file_patterns()?
            .latest_file(&self.data_dir, &self.file_pattern)
    }

    /// Portal link for one SSA
    pub fn ssa_link(&self, numero: &str) -> String {
        self.ssa_link_template.replace("{numero}", numero)
    }
}
