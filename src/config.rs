//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/division/division.toml`
//! 3. Local config: `<project_dir>/division.toml`
//! 4. Environment variables: `DIVISION_*` prefix
//!
//! Command line flags are applied on top by the CLI layer.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::DatasetPaths;
use crate::application::{ApplicationError, OutputFormat, DEFAULT_TABLE};

/// Name of the local and global config file.
pub const CONFIG_FILE_NAME: &str = "division.toml";

/// Raw settings for intermediate parsing (every field optional).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub provinces_file: Option<String>,
    pub cities_file: Option<String>,
    pub areas_file: Option<String>,
    pub streets_file: Option<String>,
    pub output: Option<PathBuf>,
    pub table: Option<String>,
    pub format: Option<OutputFormat>,
}

/// Unified configuration for division.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the record files (default: ./data)
    pub data_dir: PathBuf,
    /// Province records, relative to `data_dir`
    pub provinces_file: String,
    /// City records, relative to `data_dir`
    pub cities_file: String,
    /// Area records, relative to `data_dir`
    pub areas_file: String,
    /// Street records, relative to `data_dir`
    pub streets_file: String,
    /// Output file, `-` for stdout (default: ./division.sql)
    pub output: PathBuf,
    /// Target table of the SQL statements
    pub table: String,
    /// Output format
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            provinces_file: "provinces.json".into(),
            cities_file: "cities.json".into(),
            areas_file: "areas.json".into(),
            streets_file: "streets.json".into(),
            output: PathBuf::from("division.sql"),
            table: DEFAULT_TABLE.into(),
            format: OutputFormat::default(),
        }
    }
}

/// Get the XDG config directory for division.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "division").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_FILE_NAME)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables leave the path untouched.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Paths of the four record files.
    pub fn dataset_paths(&self) -> DatasetPaths {
        DatasetPaths {
            provinces: self.data_dir.join(&self.provinces_file),
            cities: self.data_dir.join(&self.cities_file),
            areas: self.data_dir.join(&self.areas_file),
            streets: self.data_dir.join(&self.streets_file),
        }
    }

    /// Overlay wins where it specifies a value.
    pub fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            provinces_file: overlay
                .provinces_file
                .clone()
                .unwrap_or_else(|| self.provinces_file.clone()),
            cities_file: overlay
                .cities_file
                .clone()
                .unwrap_or_else(|| self.cities_file.clone()),
            areas_file: overlay
                .areas_file
                .clone()
                .unwrap_or_else(|| self.areas_file.clone()),
            streets_file: overlay
                .streets_file
                .clone()
                .unwrap_or_else(|| self.streets_file.clone()),
            output: overlay.output.clone().unwrap_or_else(|| self.output.clone()),
            table: overlay.table.clone().unwrap_or_else(|| self.table.clone()),
            format: overlay.format.unwrap_or(self.format),
        }
    }

    /// Override the data directory, expanded like configured paths.
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        self.data_dir = expand_path(dir);
        self
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.data_dir = expand_path(&self.data_dir);
        if self.output.as_os_str() != "-" {
            self.output = expand_path(&self.output);
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional directory holding a local `division.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/division/division.toml`
    /// 3. Local config: `<project_dir>/division.toml`
    /// 4. Environment variables: `DIVISION_*` prefix
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 3. Local config
        if let Some(dir) = project_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();

        Ok(current)
    }

    /// Load from one explicit file on top of the defaults, then env vars.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        let mut current = Self::default().merge_with(&raw);
        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        Ok(current)
    }

    /// Apply DIVISION_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(Environment::with_prefix("DIVISION").separator("__"));

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("provinces_file") {
            settings.provinces_file = val;
        }
        if let Ok(val) = config.get_string("cities_file") {
            settings.cities_file = val;
        }
        if let Ok(val) = config.get_string("areas_file") {
            settings.areas_file = val;
        }
        if let Ok(val) = config.get_string("streets_file") {
            settings.streets_file = val;
        }
        if let Ok(val) = config.get_string("output") {
            settings.output = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("table") {
            settings.table = val;
        }
        if let Ok(val) = config.get_string("format") {
            settings.format = val
                .parse()
                .map_err(|message| ApplicationError::Config { message })?;
        }

        Ok(settings)
    }

    /// Render as TOML for `config show`.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: e.to_string(),
        })
    }
}
