//! Application Configuration
//!
//! Proof-service credentials, contract addresses and reward parameters.
//! Defaults match the LUKSO testnet deployment.

use std::path::PathBuf;

use alloy_primitives::hex::FromHexError;

use crate::core::types::Address;

/// Tokens minted per follower.
pub const DEFAULT_REWARD_MULTIPLIER: u64 = 1000;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An address variable is malformed.
    #[error("invalid address in {var}: {source}")]
    InvalidAddress {
        /// Environment variable name.
        var: &'static str,
        /// Parse failure.
        source: FromHexError,
    },

    /// A numeric variable is malformed.
    #[error("invalid number in {var}: {value}")]
    InvalidNumber {
        /// Environment variable name.
        var: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Proof-service application id.
    pub app_id: String,
    /// Proof-service application secret.
    pub app_secret: String,
    /// Provider id of the follower-count data source.
    pub provider_id: String,
    /// Where mobile flows return after proof generation.
    pub redirect_url: String,
    /// Cloutcoin contract; also the reward token.
    pub contract_address: Address,
    /// Tokens minted per follower.
    pub reward_multiplier: u64,
    /// Block explorer base URL.
    pub explorer_base_url: String,
    /// File backing the session store.
    pub store_path: PathBuf,
    /// Client user agent used for device classification.
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_id: "0x9a6AC46DCD8ADa0ca7f6d8a99CEB82C850BF7b91".to_string(),
            app_secret: String::new(),
            provider_id: "e6fe962d-8b4e-4ce5-abcc-3d21c88bd64a".to_string(),
            redirect_url: "https://reclaim-onchain-starterkit-evm.vercel.app/".to_string(),
            contract_address: Address::default(),
            reward_multiplier: DEFAULT_REWARD_MULTIPLIER,
            explorer_base_url: "https://explorer.execution.testnet.lukso.network".to_string(),
            store_path: PathBuf::from(".clout-claim/session.json"),
            user_agent: String::new(),
        }
    }
}

impl AppConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let contract_address = match std::env::var("CLOUT_CONTRACT_ADDRESS") {
            Ok(v) => v.parse().map_err(|source| ConfigError::InvalidAddress {
                var: "CLOUT_CONTRACT_ADDRESS",
                source,
            })?,
            Err(_) => defaults.contract_address,
        };

        let reward_multiplier = match std::env::var("CLOUT_REWARD_MULTIPLIER") {
            Ok(v) => v.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: "CLOUT_REWARD_MULTIPLIER",
                value: v,
            })?,
            Err(_) => defaults.reward_multiplier,
        };

        Ok(Self {
            app_id: std::env::var("CLOUT_APP_ID").unwrap_or(defaults.app_id),
            app_secret: std::env::var("CLOUT_APP_SECRET").unwrap_or(defaults.app_secret),
            provider_id: std::env::var("CLOUT_PROVIDER_ID").unwrap_or(defaults.provider_id),
            redirect_url: std::env::var("CLOUT_REDIRECT_URL").unwrap_or(defaults.redirect_url),
            contract_address,
            reward_multiplier,
            explorer_base_url: std::env::var("CLOUT_EXPLORER_URL")
                .unwrap_or(defaults.explorer_base_url),
            store_path: std::env::var("CLOUT_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            user_agent: std::env::var("CLOUT_USER_AGENT").unwrap_or(defaults.user_agent),
        })
    }

    /// The reward token is the minting contract itself.
    pub fn token_address(&self) -> Address {
        self.contract_address
    }
}
