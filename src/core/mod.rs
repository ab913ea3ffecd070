//! Core primitives.
//!
//! Configuration, chain identifiers and the platform classifier.

pub mod config;
pub mod device;
pub mod types;

// Re-export core types
pub use config::{AppConfig, ConfigError, DEFAULT_REWARD_MULTIPLIER};
pub use device::{classify_device, DeviceType};
pub use types::{Address, Balance, TxHash, B256, U256};
