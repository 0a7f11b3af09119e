//! Runtime configuration: an optional TOML file, then `.env`, then process
//! environment variables, later sources winning.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::error::WalletError;
use crate::registry::ChainRegistry;
use crate::types::{ChainFamily, ChainId, NetworkId};

pub const DEFAULT_ADDRESS_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("missing required setting {0}")]
    Missing(&'static str),
}

impl From<ConfigError> for WalletError {
    fn from(e: ConfigError) -> Self {
        WalletError::Config(e.to_string())
    }
}

/// Publishable SDK key. Never printed.
#[derive(Debug)]
pub struct ApiCredential(SecretString);

impl ApiCredential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Placeholder for adapters that need no key (watch-only).
    pub fn anonymous() -> Self {
        Self::new(String::new())
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::Invalid {
                key: "logging.format".into(),
                message: format!("{other:?} (expected text or json)"),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|s| !s.is_empty())
        .map(SecretString::from))
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    /// Initially active network.
    pub network: NetworkId,
    pub address_timeout_secs: u64,
    pub rpc_timeout_secs: u64,
    pub storage_dir: Option<PathBuf>,
    /// Where OAuth providers send the user back to.
    pub redirect_uri: String,
    /// Network each chain's session is scoped to, when not its mainnet.
    pub session_networks: BTreeMap<ChainId, NetworkId>,
    /// Endpoint overrides, keyed by network.
    pub rpc_urls: BTreeMap<NetworkId, String>,
    /// Fixed addresses for the watch-only adapter, keyed by chain family.
    pub watch_only: BTreeMap<ChainFamily, String>,
    pub logging: LoggingConfig,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            network: NetworkId::SolanaMainnet,
            address_timeout_secs: DEFAULT_ADDRESS_TIMEOUT_SECS,
            rpc_timeout_secs: DEFAULT_RPC_TIMEOUT_SECS,
            storage_dir: None,
            redirect_uri: DEFAULT_REDIRECT_URI.into(),
            session_networks: BTreeMap::new(),
            rpc_urls: BTreeMap::new(),
            watch_only: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WalletConfig {
    /// File (if given), then `.env`, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply environment overrides. The `NEXT_PUBLIC_` spellings used by
    /// the web build are accepted too.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .or_else(|| lookup(&format!("NEXT_PUBLIC_{name}")))
                .filter(|v| !v.trim().is_empty())
        };

        if let Some(key) = var("MAGIC_API_KEY") {
            self.api_key = Some(SecretString::from(key));
        }
        if let Some(network) = var("BLOCKCHAIN_NETWORK") {
            self.network = network.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "BLOCKCHAIN_NETWORK".into(),
                message: format!("unknown network {network:?}"),
            })?;
        }
        for id in NetworkId::ALL {
            if let Some(url) = lookup(&format!("RPC_URL_{}", id.env_suffix())) {
                self.rpc_urls.insert(id, url);
            }
        }
        if let Some(dir) = lookup("WALLET_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(dir));
        }
        if let Some(secs) = lookup("WALLET_ADDRESS_TIMEOUT_SECS") {
            self.address_timeout_secs = secs.parse().map_err(|e| ConfigError::Invalid {
                key: "WALLET_ADDRESS_TIMEOUT_SECS".into(),
                message: format!("{e}"),
            })?;
        }
        if let Some(level) = lookup("WALLET_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("WALLET_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }
        Ok(())
    }

    pub fn credential(&self) -> Result<ApiCredential, ConfigError> {
        self.api_key
            .as_ref()
            .map(|key| ApiCredential::new(key.expose_secret()))
            .ok_or(ConfigError::Missing("MAGIC_API_KEY"))
    }

    pub fn address_timeout(&self) -> Duration {
        Duration::from_secs(self.address_timeout_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    /// Built-in registry with this configuration's overrides applied.
    pub fn build_registry(&self) -> Result<ChainRegistry, WalletError> {
        let mut registry = ChainRegistry::builtin();
        for (id, url) in &self.rpc_urls {
            registry.set_rpc_url(*id, url.clone())?;
        }
        for (chain, id) in &self.session_networks {
            registry.set_session_network(*chain, *id)?;
        }
        Ok(registry)
    }
}
