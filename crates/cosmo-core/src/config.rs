//! Configuration types for CosmoDEX

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Address, Error, Result, TokenInfo};

/// Environment variable naming the JSON config file
pub const CONFIG_ENV_VAR: &str = "COSMODEX_CONFIG";

/// Token metadata as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

impl TokenConfig {
    pub fn to_token_info(&self) -> Result<TokenInfo> {
        Ok(TokenInfo::new(
            self.symbol.clone(),
            Address::parse(&self.address)?,
            self.decimals,
        ))
    }
}

/// Pool deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Token A (ICECREAM on the default deployment)
    pub token_a: TokenConfig,

    /// Token B (USDC on the default deployment)
    pub token_b: TokenConfig,

    /// Relay forwarder trusted to speak for the original sender
    #[serde(default)]
    pub trusted_forwarder: Option<String>,

    /// Identities allowed to trigger swaps on behalf of others
    #[serde(default)]
    pub operators: Vec<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            token_a: TokenConfig {
                symbol: "ICECREAM".to_string(),
                address: "0xEcAe8C3655dC10760288F62698D3d36a53918C74".to_string(),
                decimals: 18,
            },
            token_b: TokenConfig {
                symbol: "USDC".to_string(),
                address: "0x0829344670A694d66Eac833308d0b2879c2f8899".to_string(),
                decimals: 6,
            },
            trusted_forwarder: Some("0x61F2976610970AFeDc1d83229e1E21bdc3D5cbE4".to_string()),
            operators: Vec::new(),
        }
    }
}

impl PoolConfig {
    pub fn trusted_forwarder(&self) -> Result<Option<Address>> {
        self.trusted_forwarder
            .as_deref()
            .map(Address::parse)
            .transpose()
    }

    pub fn operators(&self) -> Result<Vec<Address>> {
        self.operators.iter().map(|s| Address::parse(s)).collect()
    }
}

/// Journal persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Journal file; `None` keeps state in memory only
    #[serde(default)]
    pub journal_path: Option<PathBuf>,

    /// fsync every journal append before acknowledging
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

fn default_sync_writes() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            journal_path: None,
            sync_writes: default_sync_writes(),
        }
    }
}

/// HTTP API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    19080
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pool: PoolConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

impl AppConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: AppConfig =
            serde_json::from_str(&raw).map_err(|e| Error::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by `COSMODEX_CONFIG`, or fall back to defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let a = self.pool.token_a.to_token_info()?;
        let b = self.pool.token_b.to_token_info()?;
        if a.address == b.address {
            return Err(Error::Config(format!(
                "token_a and token_b share address {}",
                a.address
            )));
        }
        self.pool.trusted_forwarder()?;
        self.pool.operators()?;
        Ok(())
    }
}
