use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use tracing::debug;

use crate::{generic::GenericWebhooksConfig, logger::LoggerConfig};

pub(crate) mod defaults;
pub mod generic;
pub mod logger;

/// Top-level bridge configuration, stored as a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing)]
    path: Option<Utf8PathBuf>,

    /// Generic inbound webhooks and their transformation scripts
    pub generic: GenericWebhooksConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerConfig,
}

impl Config {
    #[must_use]
    pub fn with_path(mut self, path: &Utf8PathBuf) -> Self {
        self.path = Some(path.clone());
        self
    }

    pub fn path(&self) -> Utf8PathBuf {
        self.path.clone().unwrap_or(Self::default_path())
    }

    /// Loads config from a json file.
    ///
    /// # Errors
    ///
    /// This function will return an error if the config path does not exist
    /// or the content is invalid
    pub fn load(path: &Utf8PathBuf) -> Result<Self> {
        debug!("Loading config from {path}");

        if !path.exists() {
            anyhow::bail!("Config file does not exist: {path}");
        }

        let contents =
            fs::read_to_string(path).context(format!("Failed reading config: {path}"))?;

        let mut cfg: Self =
            serde_json::from_str(&contents).context(format!("Failed loading config: {path}"))?;
        cfg.path = Some(path.clone());

        Ok(cfg)
    }

    /// Saves config to a json file, falling back on the default path if
    /// none is bound.
    ///
    /// # Errors
    /// This function will error if it fails writing the config
    pub fn save(&self) -> Result<()> {
        let dest = self.path();
        debug!("Saving config to {dest}");
        let contents = serde_json::to_string_pretty(self).unwrap_or(json!(self).to_string());

        fs::write(&dest, contents).context(format!("Failed writing config: {dest}"))?;

        Ok(())
    }

    /// Default config path is ./hookbridge.json
    pub fn default_path() -> Utf8PathBuf {
        Utf8PathBuf::new().join("hookbridge.json")
    }
}
