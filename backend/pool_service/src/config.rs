//! Application configuration loaded from environment variables.

use scholarship_pool::Address;

use crate::errors::{Result, ServiceError};

const DEFAULT_RPC_URL: &str = "https://soroban-testnet.stellar.org";
const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Soroban RPC endpoints to probe, in preference order
    pub rpc_urls: Vec<String>,
    /// Network the pool's token lives on
    pub network_passphrase: String,
    /// Timeout for each RPC probe
    pub rpc_timeout_secs: u64,
    /// Seed the demo pool with this creator and token when the store is empty
    pub seed: Option<SeedPool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPool {
    pub creator: Address,
    pub token: Address,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let rpc_urls: Vec<String> = var("RPC_URLS", DEFAULT_RPC_URL)
            .split(',')
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if rpc_urls.is_empty() {
            return Err(ServiceError::Config("RPC_URLS must list at least one URL".to_string()));
        }

        let seed = match (lookup("SEED_CREATOR"), lookup("SEED_TOKEN")) {
            (Some(creator), Some(token)) => Some(SeedPool {
                creator: Address::new(creator),
                token: Address::new(token),
            }),
            (None, None) => None,
            _ => {
                return Err(ServiceError::Config(
                    "SEED_CREATOR and SEED_TOKEN must be set together".to_string(),
                ))
            }
        };

        Ok(Config {
            database_url: var("DATABASE_URL", "sqlite:./scholarship_pool.db"),
            api_port: var("API_PORT", "3001")
                .parse()
                .map_err(|_| ServiceError::Config("Invalid API_PORT".to_string()))?,
            rpc_urls,
            network_passphrase: var("NETWORK_PASSPHRASE", TESTNET_PASSPHRASE),
            rpc_timeout_secs: var("RPC_TIMEOUT_SECS", "10")
                .parse()
                .map_err(|_| ServiceError::Config("Invalid RPC_TIMEOUT_SECS".to_string()))?,
            seed,
        })
    }
}
