//! Claim Controller
//!
//! Turns a held proof into a `mint` transaction and tracks it to a receipt.
//! Reads the verification session, never mutates it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{error, info, instrument, warn};

use crate::claim::eligibility::{compute_eligibility, BalanceObservation, Eligibility};
use crate::claim::wallet::{ContractCall, Receipt, Wallet, WalletError};
use crate::core::config::AppConfig;
use crate::core::types::{Address, TxHash};
use crate::proof::artifact::ProofArtifact;
use crate::proof::context::ClaimAttributes;
use crate::proof::transform::{transform, TransformError, MINT_FUNCTION};

/// Claim errors. None of them affect the verification session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// Mint requested before a proof is held.
    #[error("no proof available to mint")]
    NoProof,

    /// Proof could not be encoded for the contract.
    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),

    /// Wallet or contract rejected the submission.
    #[error("submission rejected: {0}")]
    SubmissionRejected(WalletError),

    /// Transaction reverted or its receipt never arrived.
    #[error("confirmation failed: {0}")]
    ConfirmationFailed(String),

    /// No submitted transaction matches.
    #[error("no pending transaction")]
    NoPendingTransaction,
}

/// Claim parameters.
#[derive(Debug, Clone)]
pub struct ClaimConfig {
    /// Minting contract.
    pub contract_address: Address,
    /// Reward token.
    pub token_address: Address,
    /// Tokens per follower.
    pub reward_multiplier: u64,
    /// Block explorer base URL.
    pub explorer_base_url: String,
}

impl From<&AppConfig> for ClaimConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            contract_address: config.contract_address,
            token_address: config.token_address(),
            reward_multiplier: config.reward_multiplier,
            explorer_base_url: config.explorer_base_url.clone(),
        }
    }
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Progress of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Submitted, not yet confirmed.
    Pending,
    /// Included and executed.
    Confirmed,
    /// Reverted or unconfirmable.
    Failed,
}

/// A submitted mint transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAttempt {
    /// Hash returned by the wallet.
    pub hash: TxHash,
    /// When the wallet accepted the transaction.
    pub submitted_at: DateTime<Utc>,
    /// Progress.
    pub status: AttemptStatus,
    /// Receipt, once included.
    pub receipt: Option<Receipt>,
    /// Failure message, if any.
    pub failure: Option<String>,
}

/// Drives the mint transaction and tracks the claimer's balance.
pub struct ClaimController {
    config: ClaimConfig,
    wallet: Arc<dyn Wallet>,
    balance: BalanceObservation,
    attempt: Option<TransactionAttempt>,
    last_error: Option<String>,
}

impl ClaimController {
    /// Create a controller.
    pub fn new(config: ClaimConfig, wallet: Arc<dyn Wallet>) -> Self {
        Self {
            config,
            wallet,
            balance: BalanceObservation::Pending,
            attempt: None,
            last_error: None,
        }
    }

    /// Claim parameters.
    pub fn config(&self) -> &ClaimConfig {
        &self.config
    }

    /// Latest balance observation.
    pub fn balance(&self) -> &BalanceObservation {
        &self.balance
    }

    /// Current transaction attempt.
    pub fn attempt(&self) -> Option<&TransactionAttempt> {
        self.attempt.as_ref()
    }

    /// Message of the last failed claim action.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Eligibility for the given claim attributes.
    pub fn eligibility(&self, attributes: &ClaimAttributes) -> Eligibility {
        compute_eligibility(attributes, &self.balance, self.config.reward_multiplier)
    }

    /// Re-read the claimer's token balance.
    ///
    /// Failures are logged and recorded; eligibility then reads as unknown.
    #[instrument(skip(self))]
    pub async fn refresh_balance(&mut self) -> &BalanceObservation {
        let owner = match self.wallet.address() {
            Some(owner) if self.wallet.is_connected() => owner,
            _ => {
                self.balance = BalanceObservation::Pending;
                return &self.balance;
            }
        };

        self.balance = match self.wallet.observe_balance(self.config.token_address, owner).await {
            Ok(balance) => {
                info!("Balance of {}: {}", owner, balance.display_amount());
                BalanceObservation::Resolved { balance }
            }
            Err(e) => {
                warn!("Balance error for {}: {}", owner, e);
                BalanceObservation::Failed { error: e.to_string() }
            }
        };
        &self.balance
    }

    /// Submit `mint(proof)`.
    ///
    /// Fails without submitting when no proof is held or it does not
    /// transform. Never retries.
    #[instrument(skip(self, proof))]
    pub async fn mint(&mut self, proof: Option<&ProofArtifact>) -> Result<TransactionAttempt, ClaimError> {
        self.last_error = None;

        let result = self.submit_mint(proof).await;
        match &result {
            Ok(attempt) => info!("Mint submitted: {}", attempt.hash),
            Err(e) => {
                error!("Error minting: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
        result
    }

    async fn submit_mint(&mut self, proof: Option<&ProofArtifact>) -> Result<TransactionAttempt, ClaimError> {
        let proof = proof.ok_or(ClaimError::NoProof)?;
        let onchain = transform(proof)?;

        let call = ContractCall {
            contract: self.config.contract_address,
            function: MINT_FUNCTION.to_string(),
            calldata: onchain.mint_calldata(),
            proof: onchain,
        };

        let hash = self
            .wallet
            .submit(&call)
            .await
            .map_err(ClaimError::SubmissionRejected)?;

        let attempt = TransactionAttempt {
            hash,
            submitted_at: Utc::now(),
            status: AttemptStatus::Pending,
            receipt: None,
            failure: None,
        };
        self.attempt = Some(attempt.clone());
        Ok(attempt)
    }

    /// Wait for the submitted transaction and record its receipt.
    ///
    /// A reverted transaction or a watcher failure leaves the attempt
    /// `Failed`. A confirmed mint refreshes the balance.
    #[instrument(skip(self))]
    pub async fn await_confirmation(&mut self, hash: TxHash) -> Result<Receipt, ClaimError> {
        match &self.attempt {
            Some(attempt) if attempt.hash == hash => {}
            _ => return Err(ClaimError::NoPendingTransaction),
        }

        let outcome = self.wallet.watch_confirmation(hash).await;
        let Some(attempt) = self.attempt.as_mut() else {
            return Err(ClaimError::NoPendingTransaction);
        };

        match outcome {
            Ok(receipt) if receipt.is_success() => {
                info!("Mint {} confirmed in block {}", hash, receipt.block_number);
                attempt.status = AttemptStatus::Confirmed;
                attempt.receipt = Some(receipt.clone());
                self.refresh_balance().await;
                Ok(receipt)
            }
            Ok(receipt) => {
                let message = format!("transaction {} reverted", hash);
                error!("Receipt error: {}", message);
                attempt.status = AttemptStatus::Failed;
                attempt.receipt = Some(receipt);
                attempt.failure = Some(message.clone());
                self.last_error = Some(message.clone());
                Err(ClaimError::ConfirmationFailed(message))
            }
            Err(e) => {
                error!("Receipt error for {}: {}", hash, e);
                attempt.status = AttemptStatus::Failed;
                attempt.failure = Some(e.to_string());
                self.last_error = Some(e.to_string());
                Err(ClaimError::ConfirmationFailed(e.to_string()))
            }
        }
    }

    /// Explorer link for a confirmed transaction.
    pub fn explorer_url(&self) -> Option<String> {
        let attempt = self.attempt.as_ref()?;
        let receipt = attempt.receipt.as_ref().filter(|r| r.is_success())?;
        Some(format!(
            "{}/tx/{}",
            self.config.explorer_base_url.trim_end_matches('/'),
            receipt.transaction_hash
        ))
    }

    /// Forget the transaction attempt for a new verification cycle.
    pub fn reset(&mut self) {
        self.attempt = None;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::eligibility::UnknownReason;
    use crate::claim::wallet::ReceiptStatus;
    use crate::core::types::{Balance, U256};
    use crate::proof::artifact::fixtures::*;
    use crate::testing::FakeWallet;

    fn controller(wallet: Arc<FakeWallet>) -> ClaimController {
        let config = ClaimConfig {
            contract_address: Address::new([0x11; 20]),
            token_address: Address::new([0x11; 20]),
            reward_multiplier: 1000,
            explorer_base_url: "https://explorer.example/".into(),
        };
        ClaimController::new(config, wallet)
    }

    #[tokio::test]
    async fn test_mint_without_proof_does_not_submit() {
        let wallet = Arc::new(FakeWallet::connected());
        let mut claims = controller(wallet.clone());

        let result = claims.mint(None).await;

        assert_eq!(result, Err(ClaimError::NoProof));
        assert!(wallet.submissions().is_empty());
        assert!(claims.attempt().is_none());
        assert_eq!(claims.last_error(), Some("no proof available to mint"));
    }

    #[tokio::test]
    async fn test_malformed_proof_does_not_submit() {
        let wallet = Arc::new(FakeWallet::connected());
        let mut claims = controller(wallet.clone());
        let mut proof = twitter_proof(1);
        proof.claim_data.owner = "bogus".into();

        let result = claims.mint(Some(&proof)).await;

        assert!(matches!(result, Err(ClaimError::Transform(_))));
        assert!(wallet.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_mint_submits_transformed_proof() {
        let wallet = Arc::new(FakeWallet::connected());
        let mut claims = controller(wallet.clone());
        let proof = twitter_proof(250);

        let attempt = claims.mint(Some(&proof)).await.unwrap();

        assert_eq!(attempt.status, AttemptStatus::Pending);
        let submissions = wallet.submissions();
        assert_eq!(submissions.len(), 1);
        let call = &submissions[0];
        assert_eq!(call.function, "mint");
        assert_eq!(call.contract, Address::new([0x11; 20]));
        assert_eq!(call.proof, transform(&proof).unwrap());
        assert_eq!(call.calldata, call.proof.mint_calldata());
    }

    #[tokio::test]
    async fn test_rejected_submission_not_retried() {
        let wallet = Arc::new(FakeWallet::connected());
        wallet.reject_next_submission("user denied");
        let mut claims = controller(wallet.clone());

        let result = claims.mint(Some(&twitter_proof(3))).await;

        assert_eq!(
            result,
            Err(ClaimError::SubmissionRejected(WalletError::Rejected("user denied".into())))
        );
        assert_eq!(wallet.submit_calls(), 1);
        assert!(claims.attempt().is_none());

        // Manual retry goes through
        assert!(claims.mint(Some(&twitter_proof(3))).await.is_ok());
        assert_eq!(wallet.submit_calls(), 2);
    }

    #[tokio::test]
    async fn test_confirmation_records_receipt_and_refreshes_balance() {
        let wallet = Arc::new(FakeWallet::connected());
        let mut claims = controller(wallet.clone());
        let attempt = claims.mint(Some(&twitter_proof(250))).await.unwrap();
        wallet.set_balance(Balance::new(U256::from(250_000u64), 0));

        let receipt = claims.await_confirmation(attempt.hash).await.unwrap();

        assert_eq!(receipt.transaction_hash, attempt.hash);
        let stored = claims.attempt().unwrap();
        assert_eq!(stored.status, AttemptStatus::Confirmed);
        assert_eq!(stored.receipt.as_ref(), Some(&receipt));
        assert_eq!(claims.balance().balance(), Some(Balance::new(U256::from(250_000u64), 0)));
        assert_eq!(
            claims.explorer_url(),
            Some(format!("https://explorer.example/tx/{}", attempt.hash))
        );
    }

    #[tokio::test]
    async fn test_reverted_transaction_is_failure() {
        let wallet = Arc::new(FakeWallet::connected());
        wallet.set_receipt_status(ReceiptStatus::Reverted);
        let mut claims = controller(wallet.clone());
        let attempt = claims.mint(Some(&twitter_proof(250))).await.unwrap();

        let result = claims.await_confirmation(attempt.hash).await;

        assert!(matches!(result, Err(ClaimError::ConfirmationFailed(_))));
        assert_eq!(claims.attempt().unwrap().status, AttemptStatus::Failed);
        assert_eq!(claims.explorer_url(), None);
    }

    #[tokio::test]
    async fn test_watcher_failure_is_failure() {
        let wallet = Arc::new(FakeWallet::connected());
        wallet.fail_confirmation("receipt timeout");
        let mut claims = controller(wallet.clone());
        let attempt = claims.mint(Some(&twitter_proof(250))).await.unwrap();

        let result = claims.await_confirmation(attempt.hash).await;

        assert_eq!(
            result,
            Err(ClaimError::ConfirmationFailed("rpc error: receipt timeout".into()))
        );
        let stored = claims.attempt().unwrap();
        assert_eq!(stored.status, AttemptStatus::Failed);
        assert!(stored.receipt.is_none());
    }

    #[tokio::test]
    async fn test_confirmation_of_unknown_hash() {
        let wallet = Arc::new(FakeWallet::connected());
        let mut claims = controller(wallet);

        let result = claims.await_confirmation(TxHash::new([9; 32])).await;
        assert_eq!(result, Err(ClaimError::NoPendingTransaction));
    }

    #[tokio::test]
    async fn test_balance_observation() {
        let wallet = Arc::new(FakeWallet::connected());
        wallet.set_balance(Balance::new(U256::from(500u64), 2));
        let mut claims = controller(wallet.clone());

        let attrs = ClaimAttributes { username: Some("alice".into()), followers_count: Some(250) };
        assert_eq!(
            claims.eligibility(&attrs),
            Eligibility::Unknown { reason: UnknownReason::BalancePending }
        );

        claims.refresh_balance().await;
        assert_eq!(claims.balance().balance().unwrap().display_amount(), 5.0);
        assert_eq!(claims.eligibility(&attrs).already_claimed(), Some(true));

        wallet.fail_balance("node unreachable");
        claims.refresh_balance().await;
        assert_eq!(
            claims.eligibility(&attrs),
            Eligibility::Unknown { reason: UnknownReason::BalanceUnavailable }
        );
    }

    #[tokio::test]
    async fn test_disconnected_wallet_balance_pending() {
        let wallet = Arc::new(FakeWallet::disconnected());
        let mut claims = controller(wallet);

        assert_eq!(claims.refresh_balance().await, &BalanceObservation::Pending);
    }

    #[tokio::test]
    async fn test_reset_drops_attempt() {
        let wallet = Arc::new(FakeWallet::connected());
        let mut claims = controller(wallet);
        claims.mint(Some(&twitter_proof(1))).await.unwrap();

        claims.reset();
        assert!(claims.attempt().is_none());
    }
}
