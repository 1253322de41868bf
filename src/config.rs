//! Configuration file handling.
//!
//! Lookup order:
//! - an explicit `--config` path
//! - `./config.json`
//! - `config.json` in the platform config directory

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use dutycal_core::feed::FeedSettings;
use dutycal_core::models::{Component, Components, Roster, Triager};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::CliError;

/// Configuration file name.
pub const CONFIG_FILE: &str = "config.json";

/// Get the platform config directory path.
fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "dutycal", "dutycal").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Components are either a name → metadata object or, in older files, a plain list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ComponentsConfig {
    Described(Map<String, Value>),
    Names(Vec<String>),
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self::Names(Vec::new())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteConfig {
    /// Published copy used to seed `init`.
    pub url: Option<String>,
    /// Where `publish` pushes artifacts: an http(s) URL or a directory.
    pub publish_url: Option<String>,
    /// Environment variable holding a bearer token for HTTP publishing.
    pub token_env: Option<String>,
}

impl RemoteConfig {
    pub fn token(&self) -> Option<String> {
        self.token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Triager name → opaque metadata, in rotation order.
    pub triagers: Map<String, Value>,

    #[serde(default)]
    pub components: ComponentsConfig,

    #[serde(default)]
    pub calendar: FeedSettings,

    #[serde(default)]
    pub remote: RemoteConfig,
}

impl Config {
    /// Resolve which config file to read.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Ok(local);
        }

        config_dir()
            .map(|dir| dir.join(CONFIG_FILE))
            .filter(|path| path.exists())
            .ok_or_else(|| CliError::Config {
                path: local,
                message: "no configuration file found".to_string(),
            })
    }

    pub fn load(path: &Path) -> Result<Self, CliError> {
        let contents = fs::read_to_string(path).map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(path, &contents)
    }

    pub fn parse(path: &Path, contents: &str) -> Result<Self, CliError> {
        let config: Config = serde_json::from_str(contents).map_err(|e| CliError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some((earlier, later)) = config.components().slug_collision() {
            return Err(CliError::Config {
                path: path.to_path_buf(),
                message: format!(
                    "components {:?} and {:?} would share the calendar file {}.json",
                    earlier.name,
                    later.name,
                    later.slug()
                ),
            });
        }
        tracing::debug!(
            path = %path.display(),
            triagers = config.triagers.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn roster(&self) -> Roster {
        Roster::new(
            self.triagers
                .iter()
                .map(|(name, metadata)| Triager::new(name.clone(), metadata.clone()))
                .collect(),
        )
    }

    pub fn components(&self) -> Components {
        match &self.components {
            ComponentsConfig::Described(map) => Components::new(
                map.iter()
                    .map(|(name, metadata)| Component::new(name.clone(), metadata.clone()))
                    .collect(),
            ),
            ComponentsConfig::Names(names) => Components::from_names(names.iter().cloned()),
        }
    }
}
