//! Claim Eligibility
//!
//! Combines the disclosed follower count with the observed token balance.
//! A balance that has not loaded, or failed to load, never counts as zero.

use serde::{Serialize, Deserialize};

use crate::core::types::Balance;
use crate::proof::context::ClaimAttributes;

/// Latest knowledge of the claimer's token balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BalanceObservation {
    /// Not loaded yet.
    #[default]
    Pending,
    /// Loaded.
    Resolved {
        /// Observed balance.
        balance: Balance,
    },
    /// Query failed.
    Failed {
        /// Failure message.
        error: String,
    },
}

impl BalanceObservation {
    /// The balance, if resolved.
    pub fn balance(&self) -> Option<Balance> {
        match self {
            BalanceObservation::Resolved { balance } => Some(*balance),
            _ => None,
        }
    }
}

/// Why eligibility cannot be decided yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReason {
    /// Balance still loading.
    BalancePending,
    /// Balance query failed.
    BalanceUnavailable,
    /// Proof carries no usable follower count.
    NoClaimData,
}

/// Definitive eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEligibility {
    /// Disclosed follower count.
    pub followers_count: u64,
    /// Tokens the mint would produce.
    pub mintable_amount: u128,
    /// Tokens already held.
    pub already_claimed: bool,
    /// Balance the decision was based on.
    pub balance: Balance,
}

/// Eligibility, or why it is not known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Eligibility {
    /// Not decidable yet.
    Unknown {
        /// Missing input.
        reason: UnknownReason,
    },
    /// Decided.
    Known(ClaimEligibility),
}

impl Eligibility {
    /// Tri-state already-claimed flag.
    pub fn already_claimed(&self) -> Option<bool> {
        match self {
            Eligibility::Known(e) => Some(e.already_claimed),
            Eligibility::Unknown { .. } => None,
        }
    }

    /// Whether a mint should be offered.
    pub fn can_mint(&self) -> bool {
        matches!(self, Eligibility::Known(e) if !e.already_claimed)
    }
}

/// Tokens minted for a follower count.
pub fn mintable_amount(followers_count: u64, reward_multiplier: u64) -> u128 {
    u128::from(followers_count) * u128::from(reward_multiplier)
}

/// Derive eligibility from a parsed proof and a balance observation.
pub fn compute_eligibility(
    attributes: &ClaimAttributes,
    balance: &BalanceObservation,
    reward_multiplier: u64,
) -> Eligibility {
    let balance = match balance {
        BalanceObservation::Pending => {
            return Eligibility::Unknown { reason: UnknownReason::BalancePending };
        }
        BalanceObservation::Failed { .. } => {
            return Eligibility::Unknown { reason: UnknownReason::BalanceUnavailable };
        }
        BalanceObservation::Resolved { balance } => *balance,
    };

    let Some(followers_count) = attributes.followers_count else {
        return Eligibility::Unknown { reason: UnknownReason::NoClaimData };
    };

    Eligibility::Known(ClaimEligibility {
        followers_count,
        mintable_amount: mintable_amount(followers_count, reward_multiplier),
        already_claimed: balance.is_positive(),
        balance,
    })
}
