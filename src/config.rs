use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::Deserialize;

use crate::persistence::{JsonFileStorage, WISHLISTS_FILE_NAME};

pub const DEFAULT_BRIDGE_HOST: &str = "127.0.0.1";
pub const DEFAULT_BRIDGE_PORT: u16 = 6521;

const CONFIG_FILE_NAME: &str = "config.json";
const ENV_PORT: &str = "WISHCRAFT_PORT";
const ENV_DATA_FILE: &str = "WISHCRAFT_DATA_FILE";
const ENV_LOG_LEVEL: &str = "WISHCRAFT_LOG_LEVEL";

/// How the add-item endpoint acknowledges a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckPolicy {
    /// Respond as soon as the mutation is queued for the store.
    #[default]
    Scheduled,
    /// Respond after the store has applied and saved the mutation.
    Persisted,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub ack: AckPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: DEFAULT_BRIDGE_HOST.to_string(),
            port: DEFAULT_BRIDGE_PORT,
            ack: AckPolicy::default(),
        }
    }
}

impl BridgeConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub data_file: Option<String>,
    pub bridge: BridgeConfig,
    pub log_level: String,
    pub log_to_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            bridge: BridgeConfig::default(),
            log_level: "info".to_string(),
            log_to_file: true,
        }
    }
}

impl AppConfig {
    /// `~/.config/wishcraft/config.json`
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::home_dir()?;
        path.push(".config");
        path.push("wishcraft");
        path.push(CONFIG_FILE_NAME);
        Some(path)
    }

    /// Reads the user config file and applies environment overrides.
    ///
    /// A missing file yields defaults. A malformed file is an error so the
    /// caller can report it once logging is up.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(std::env::vars());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("malformed config file: {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => {
                Err(err).with_context(|| format!("read config failed: {}", path.display()))
            }
        }
    }

    pub fn apply_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                ENV_PORT => {
                    if let Ok(port) = value.parse() {
                        self.bridge.port = port;
                    }
                }
                ENV_DATA_FILE => self.data_file = Some(value.to_string()),
                ENV_LOG_LEVEL => self.log_level = value.to_string(),
                _ => {}
            }
        }
    }

    /// Where the durable wishlist file lives.
    pub fn data_file(&self) -> PathBuf {
        self.data_file
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(expand_tilde_path)
            .or_else(JsonFileStorage::default_path)
            .unwrap_or_else(|| PathBuf::from(WISHLISTS_FILE_NAME))
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level.trim().parse().unwrap_or(LevelFilter::Info)
    }
}

pub fn expand_tilde_path(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}
