use serde::Deserialize;

use crate::address::format::{self, ChainProfile};
use crate::receive::ReceiveProtectionConfig;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub shield: ShieldConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub receive_protection: ReceiveProtectionConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

// ============================================================
// Shield Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ShieldConfig {
    pub own_address: Option<String>,
    #[serde(default = "default_risk_threshold")]
    pub risk_threshold: u8,
    #[serde(default = "default_chain")]
    pub chain: String,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            own_address: None,
            risk_threshold: default_risk_threshold(),
            chain: default_chain(),
        }
    }
}

impl ShieldConfig {
    pub fn chain_profile(&self) -> ChainProfile {
        ChainProfile::for_chain(&self.chain)
    }
}

fn default_risk_threshold() -> u8 {
    40
}

fn default_chain() -> String {
    "solana".to_string()
}

// ============================================================
// Registry Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct RegistryConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,
    #[serde(default = "default_local_store_path")]
    pub local_store_path: String,
    pub blocklist_path: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            remote_timeout_ms: default_remote_timeout_ms(),
            local_store_path: default_local_store_path(),
            blocklist_path: None,
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_remote_timeout_ms() -> u64 {
    3000
}

fn default_local_store_path() -> String {
    "malicious_addresses.json".to_string()
}

// ============================================================
// API Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_port() -> u16 {
    3000
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> eyre::Result<()> {
        if !(1..=100).contains(&self.shield.risk_threshold) {
            return Err(eyre::eyre!(
                "risk_threshold must be between 1 and 100, got {}",
                self.shield.risk_threshold
            ));
        }
        if self.registry.cache_ttl_secs == 0 {
            return Err(eyre::eyre!("cache_ttl_secs must be greater than zero"));
        }
        if let Some(own) = &self.shield.own_address {
            let check = format::validate_for(&self.shield.chain_profile(), own);
            if !check.valid {
                return Err(eyre::eyre!(
                    "Invalid own_address '{}' for chain '{}': {}",
                    own,
                    self.shield.chain,
                    check.reason.unwrap_or("invalid")
                ));
            }
        }
        Ok(())
    }
}
