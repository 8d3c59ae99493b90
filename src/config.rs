//! Runtime configuration
//!
//! Read from TOML. Lookup order:
//! 1) an explicit path
//! 2) $JOBSCRAPE_CONFIG
//! 3) ./jobscrape.toml
//! 4) built-in defaults

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::sites::AdapterProfile;

const ENV_PATH: &str = "JOBSCRAPE_CONFIG";
const LOCAL_FILE: &str = "jobscrape.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store_path: PathBuf,
    pub expansion_timeout_ms: u64,
    /// Extra or replacement site adapters
    pub adapters: Vec<AdapterProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            expansion_timeout_ms: 100,
            adapters: Vec::new(),
        }
    }
}

impl Config {
    pub fn expansion_timeout(&self) -> Duration {
        Duration::from_millis(self.expansion_timeout_ms)
    }

    pub fn from_toml(s: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: origin.display().to_string(),
            source,
        })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Ok(p) = std::env::var(ENV_PATH) {
            let path = PathBuf::from(&p);
            if !path.exists() {
                return Err(ConfigError::MissingEnvPath(p));
            }
            return Self::load_from(&path);
        }
        let local = PathBuf::from(LOCAL_FILE);
        if local.exists() {
            return Self::load_from(&local);
        }
        Ok(Self::default())
    }
}

/// `<data dir>/jobscrape/store.json`, or `./jobscrape-store.json` when the
/// platform has no data directory.
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("jobscrape").join("store.json"))
        .unwrap_or_else(|| PathBuf::from("jobscrape-store.json"))
}
