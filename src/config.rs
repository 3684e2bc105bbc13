//! Configuration management

use std::{env, path::Path};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Prefix for environment overrides (`PIN_AUTHORIZER_SERVER__PORT=9000`).
pub const ENV_PREFIX: &str = "PIN_AUTHORIZER_";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before resolving secrets.
    /// Paths support ~ expansion. Loaded in order, later files override earlier.
    pub env_files: Vec<String>,
    /// HTTP listener
    pub server: ServerConfig,
    /// Pinned record source
    pub pins: PinsConfig,
    /// Trust store for chain retrieval
    pub tls: TlsConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Where the pinned record comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PinsConfig {
    /// Secret reference resolved on every invocation.
    ///
    /// Supports `{env.VAR}`, `{keychain.SERVICE}` and `{file.PATH}`; a value
    /// without patterns is taken as the literal JSON record.
    pub secret: String,
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            secret: "{env.PINNED_CHAIN_SECRET}".to_string(),
        }
    }
}

/// Trust store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TlsConfig {
    /// PEM CA bundle replacing the system trust store
    pub ca_bundle: Option<String>,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        // Env files first so ${VAR} expansion and {env.VAR} secrets see them
        config.load_env_files();
        config.expand_env_vars();

        Ok(config)
    }

    /// Load environment files into the process environment.
    /// Supports ~ expansion. Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = expand_home(path_str);
            let path = Path::new(&expanded);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                    Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
                }
            } else {
                tracing::debug!("Env file not found (skipped): {expanded}");
            }
        }
    }

    /// Expand ${VAR} and ${VAR:-default} patterns in config values
    fn expand_env_vars(&mut self) {
        let Ok(re) = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}") else {
            return;
        };

        self.pins.secret = Self::expand_string(&re, &self.pins.secret);
        if let Some(bundle) = self.tls.ca_bundle.as_mut() {
            *bundle = expand_home(&Self::expand_string(&re, bundle));
        }
    }

    /// Expand environment variables in a string
    fn expand_string(re: &Regex, value: &str) -> String {
        re.replace_all(value, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default = caps.get(2).map_or("", |m| m.as_str());
            env::var(var_name).unwrap_or_else(|_| default.to_string())
        })
        .into_owned()
    }
}

/// Replace a leading `~` with the home directory.
pub(crate) fn expand_home(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.display().to_string(), 1);
        }
    }
    path.to_string()
}
