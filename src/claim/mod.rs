//! Token Claim
//!
//! Eligibility from proof plus balance, and the `mint` transaction lifecycle.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CLAIM FLOW                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  eligibility.rs - Mintable amount, already-claimed check    │
//! │  controller.rs  - Mint submission, confirmation, balance    │
//! │  wallet.rs      - Wallet / chain collaborator               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod controller;
pub mod eligibility;
pub mod wallet;

pub use controller::{ClaimController, ClaimConfig, ClaimError, TransactionAttempt, AttemptStatus};
pub use eligibility::{
    Eligibility, ClaimEligibility, BalanceObservation, UnknownReason, compute_eligibility,
    mintable_amount,
};
pub use wallet::{Wallet, WalletError, ContractCall, Receipt, ReceiptStatus};
