// flowsync/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::model::{SyncConfig, SyncDefinition};

/// Overrides the location of `config.json`.
pub const CONFIG_PATH_ENV: &str = "FLOWSYNC_CONFIG";
pub const AIRTABLE_TOKEN_ENV: &str = "AIRTABLE_TOKEN";
pub const WEBFLOW_TOKEN_ENV: &str = "WEBFLOW_TOKEN";

const DEFAULT_CONFIG_FILE: &str = "config.json";
const DEFAULT_LOG_DIR: &str = "sync-logs";

// Structs for deserializing config.json
#[derive(Debug, Clone, Deserialize)]
pub struct RawJsonConfig {
    /// Named API tokens the syncs refer to.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub syncs: Vec<SyncDefinition>,
}

/// API tokens for one sync run.
#[derive(Clone)]
pub struct Credentials {
    pub airtable: String,
    pub webflow: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("airtable", &"[redacted]")
            .field("webflow", &"[redacted]")
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub syncs: Vec<SyncConfig>,
    pub log_dir: PathBuf,
    tokens: HashMap<String, String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut token_names: Vec<&String> = self.tokens.keys().collect();
        token_names.sort();
        f.debug_struct("AppConfig")
            .field("syncs", &self.syncs.iter().map(|s| &s.name).collect::<Vec<_>>())
            .field("log_dir", &self.log_dir)
            .field("tokens", &token_names)
            .finish()
    }
}

impl AppConfig {
    /// `FLOWSYNC_CONFIG` if set, otherwise `config.json` in the working directory.
    pub fn default_path() -> PathBuf {
        env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        let raw_json_config: RawJsonConfig = serde_json::from_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })?;
        Self::from_raw(raw_json_config)
    }

    /// Validates every sync up front so a broken definition fails before any
    /// request is made.
    pub fn from_raw(raw: RawJsonConfig) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut syncs = Vec::with_capacity(raw.syncs.len());
        for definition in raw.syncs {
            if !seen.insert(definition.id.clone()) {
                anyhow::bail!("Sync id \"{}\" appears more than once in config.json", definition.id);
            }
            let name = definition.name.clone();
            let sync = SyncConfig::try_from(definition)
                .with_context(|| format!("Invalid sync definition \"{}\"", name))?;
            syncs.push(sync);
        }

        Ok(AppConfig {
            syncs,
            log_dir: raw.log_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            tokens: raw.tokens,
        })
    }

    /// Picks the sync named by `choice` (id or name). Without a choice, the
    /// only configured sync is used.
    pub fn select_sync(&self, choice: Option<&str>) -> Result<&SyncConfig> {
        match choice.map(str::trim).filter(|c| !c.is_empty()) {
            Some(choice) => self
                .syncs
                .iter()
                .find(|s| s.id == choice)
                .or_else(|| self.syncs.iter().find(|s| s.name.eq_ignore_ascii_case(choice)))
                .with_context(|| format!("No sync with id or name \"{}\". Available: {}", choice, self.sync_list())),
            None => match self.syncs.as_slice() {
                [only] => Ok(only),
                [] => anyhow::bail!("No syncs are defined in config.json"),
                _ => anyhow::bail!(
                    "Several syncs are defined; pass one as the first argument. Available: {}",
                    self.sync_list()
                ),
            },
        }
    }

    fn sync_list(&self) -> String {
        self.syncs
            .iter()
            .map(|s| format!("{} ({})", s.name, s.id))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Tokens for `sync`, with `AIRTABLE_TOKEN` / `WEBFLOW_TOKEN` taking precedence.
    pub fn credentials_for(&self, sync: &SyncConfig) -> Result<Credentials> {
        self.resolve_credentials(sync, |key| env::var(key).ok())
    }

    fn resolve_credentials(&self, sync: &SyncConfig, env_lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
        let resolve = |service: &str, env_key: &str, token_name: Option<&String>| -> Result<String> {
            if let Some(token) = env_lookup(env_key).filter(|t| !t.trim().is_empty()) {
                return Ok(token);
            }
            let token_name = token_name
                .with_context(|| format!("Sync \"{}\" does not name a {} token and {} is not set", sync.name, service, env_key))?;
            self.tokens
                .get(token_name)
                .filter(|t| !t.trim().is_empty())
                .cloned()
                .with_context(|| format!("{} token \"{}\" is not defined in config.json", service, token_name))
        };

        Ok(Credentials {
            airtable: resolve("Airtable", AIRTABLE_TOKEN_ENV, sync.tokens.airtable.as_ref())?,
            webflow: resolve("Webflow", WEBFLOW_TOKEN_ENV, sync.tokens.webflow.as_ref())?,
        })
    }
}
