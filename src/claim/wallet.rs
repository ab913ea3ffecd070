//! Wallet / Chain Interface
//!
//! The connected wallet and the node behind it. Submission, confirmation
//! watching and balance reads all go through here.

use async_trait::async_trait;
use serde::{Serialize, Deserialize};

use crate::core::types::{Address, Balance, TxHash};
use crate::proof::transform::OnchainProof;

/// Wallet errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// No wallet connected.
    #[error("wallet not connected")]
    NotConnected,

    /// User or contract rejected the transaction.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Node or transport failure.
    #[error("rpc error: {0}")]
    Rpc(String),
}

/// A contract write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Target contract.
    pub contract: Address,
    /// Function name.
    pub function: String,
    /// Sole argument.
    pub proof: OnchainProof,
    /// Encoded call (selector + argument).
    pub calldata: Vec<u8>,
}

/// Outcome recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    /// Executed.
    Success,
    /// Reverted.
    Reverted,
}

/// Transaction receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Transaction hash.
    pub transaction_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Execution outcome.
    pub status: ReceiptStatus,
}

impl Receipt {
    /// Whether the transaction executed.
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// The connected wallet.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// A wallet is connected.
    fn is_connected(&self) -> bool;

    /// Connected account.
    fn address(&self) -> Option<Address>;

    /// Sign and broadcast a contract write; returns once the hash is known.
    async fn submit(&self, call: &ContractCall) -> Result<TxHash, WalletError>;

    /// Wait for the transaction to be included.
    async fn watch_confirmation(&self, hash: TxHash) -> Result<Receipt, WalletError>;

    /// Read a token balance.
    async fn observe_balance(&self, token: Address, owner: Address) -> Result<Balance, WalletError>;
}
