//! Chain Primitive Types
//!
//! Account and hash types come from `alloy-primitives`; the balance pairs a
//! `uint256` amount with the token's decimals.

use serde::{Serialize, Deserialize};

pub use alloy_primitives::{Address, B256, U256};

/// 32-byte transaction hash.
pub type TxHash = B256;

/// Token balance as reported by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Raw amount in base units.
    pub value: U256,
    /// Number of decimals of the token.
    pub decimals: u8,
}

impl Balance {
    /// Create a balance.
    pub const fn new(value: U256, decimals: u8) -> Self {
        Self { value, decimals }
    }

    /// Amount scaled by `10^decimals` for display.
    ///
    /// Precision is lost beyond 53 bits of mantissa.
    pub fn display_amount(&self) -> f64 {
        let raw: f64 = self.value.to_string().parse().unwrap_or(f64::INFINITY);
        raw / 10f64.powi(i32::from(self.decimals))
    }

    /// Whether any tokens are held.
    pub fn is_positive(&self) -> bool {
        !self.value.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse() {
        let addr: Address = "0x9a6ac46dcd8ada0ca7f6d8a99ceb82c850bf7b91".parse().unwrap();
        assert_eq!(addr.as_slice()[0], 0x9a);
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);

        let unprefixed: Address = "9a6AC46DCD8ADa0ca7f6d8a99CEB82C850BF7b91".parse().unwrap();
        assert_eq!(unprefixed, addr);
    }

    #[test]
    fn test_malformed_hex_rejected() {
        assert!("0xdeadbeef".parse::<TxHash>().is_err());
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[test]
    fn test_balance_display() {
        let balance = Balance::new(U256::from(500u64), 2);
        assert_eq!(balance.display_amount(), 5.0);
        assert!(balance.is_positive());
        assert!(!Balance::new(U256::ZERO, 18).is_positive());
    }

    #[test]
    fn test_balance_beyond_u128() {
        let balance = Balance::new(U256::MAX, 18);
        assert!(balance.is_positive());
        assert!(balance.display_amount() > 1e59);
    }

    #[test]
    fn test_hash_serializes_as_hex() {
        let hash = TxHash::new([0xab; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));
        let back: TxHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }
}
