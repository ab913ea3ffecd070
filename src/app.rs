//! Claim Application
//!
//! Wires the verification session to the claim flow and renders the
//! snapshot the user-facing surface displays.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::claim::controller::{ClaimConfig, ClaimController, ClaimError, TransactionAttempt};
use crate::claim::eligibility::{mintable_amount, Eligibility};
use crate::claim::wallet::{Receipt, Wallet};
use crate::core::config::AppConfig;
use crate::session::controller::{
    SessionStatus, VerificationConfig, VerificationController, VerificationError, VerificationState,
};
use crate::session::remote::{callback_channel, CallbackEvent, ProofService, StatusPoller};
use crate::session::store::SessionStore;

/// What the user sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimView {
    /// Session lifecycle.
    pub status: SessionStatus,
    /// URL to render as a QR code or open directly.
    pub request_url: Option<String>,
    /// Proven username.
    pub username: Option<String>,
    /// Proven follower count.
    pub followers: Option<u64>,
    /// Token balance in display units.
    pub balance: Option<f64>,
    /// Tokens the proof would mint.
    pub mintable_amount: Option<u128>,
    /// `None` while the balance is unknown.
    pub already_claimed: Option<bool>,
    /// Mint action offered.
    pub can_mint: bool,
    /// Current mint transaction.
    pub transaction: Option<TransactionAttempt>,
    /// Explorer link of a confirmed mint.
    pub explorer_url: Option<String>,
    /// Most recent failure.
    pub last_error: Option<String>,
}

impl ClaimView {
    /// Snapshot both controllers.
    pub fn capture(verification: &VerificationController, claims: &ClaimController) -> Self {
        let attributes = verification.claim_attributes();
        let eligibility = claims.eligibility(attributes);
        let completed = verification.state() == VerificationState::Completed;

        Self {
            status: verification.state().session_status(),
            request_url: verification.request_url().map(str::to_string),
            username: attributes.username.clone(),
            followers: attributes.followers_count,
            balance: claims.balance().balance().map(|b| b.display_amount()),
            mintable_amount: attributes
                .followers_count
                .map(|n| mintable_amount(n, claims.config().reward_multiplier)),
            already_claimed: eligibility.already_claimed(),
            can_mint: completed && eligibility.can_mint(),
            transaction: claims.attempt().cloned(),
            explorer_url: claims.explorer_url(),
            last_error: claims
                .last_error()
                .or(verification.last_error())
                .map(str::to_string),
        }
    }
}

/// Verification session plus claim flow for one connected wallet.
pub struct ClaimApp {
    verification: VerificationController,
    claims: ClaimController,
    callbacks: mpsc::UnboundedReceiver<CallbackEvent>,
}

impl ClaimApp {
    /// Assemble the application from its collaborators.
    pub fn new(
        config: &AppConfig,
        service: Arc<dyn ProofService>,
        poller: Arc<dyn StatusPoller>,
        store: Arc<dyn SessionStore>,
        wallet: Arc<dyn Wallet>,
    ) -> Self {
        let (tx, rx) = callback_channel();
        let verification =
            VerificationController::new(VerificationConfig::from(config), service, poller, store, tx);
        let claims = ClaimController::new(ClaimConfig::from(config), wallet);

        Self { verification, claims, callbacks: rx }
    }

    /// Verification session.
    pub fn verification(&self) -> &VerificationController {
        &self.verification
    }

    /// Claim flow.
    pub fn claims(&self) -> &ClaimController {
        &self.claims
    }

    /// Current eligibility.
    pub fn eligibility(&self) -> Eligibility {
        self.claims.eligibility(self.verification.claim_attributes())
    }

    /// Current snapshot.
    pub fn view(&self) -> ClaimView {
        ClaimView::capture(&self.verification, &self.claims)
    }

    /// Wallet connected: load the balance, then recover or start a session.
    #[instrument(skip(self))]
    pub async fn connect(&mut self) -> Result<(), VerificationError> {
        self.claims.refresh_balance().await;
        self.verification.connect().await
    }

    /// Load the balance and poll the persisted session without initiating.
    #[instrument(skip(self))]
    pub async fn recover(&mut self) -> Result<bool, VerificationError> {
        self.claims.refresh_balance().await;
        self.verification.recover().await
    }

    /// Apply the next queued callback, if one is waiting.
    pub fn drain_callback(&mut self) -> bool {
        match self.callbacks.try_recv() {
            Ok(event) => self.verification.handle_callback(event),
            Err(_) => false,
        }
    }

    /// Wait until the session leaves `AwaitingCompletion`.
    ///
    /// Callbacks are applied as they arrive and the status URL is polled
    /// every `poll_interval`; whichever yields proofs first wins.
    #[instrument(skip(self))]
    pub async fn run_until_resolved(&mut self, poll_interval: Duration) -> VerificationState {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        while self.verification.state() == VerificationState::AwaitingCompletion {
            tokio::select! {
                Some(event) = self.callbacks.recv() => {
                    self.verification.handle_callback(event);
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.verification.poll_status().await {
                        warn!("Status poll error: {}", e);
                    }
                }
            }
        }

        debug!("Session resolved as {:?}", self.verification.state());
        self.verification.state()
    }

    /// Mint with the held proof and wait for the receipt.
    #[instrument(skip(self))]
    pub async fn mint(&mut self) -> Result<Receipt, ClaimError> {
        let attempt = self.claims.mint(self.verification.primary_proof()).await?;
        self.claims.await_confirmation(attempt.hash).await
    }

    /// Drop the current proof and transaction and start a new session.
    #[instrument(skip(self))]
    pub async fn reset_for_another_verification(&mut self) -> Result<(), VerificationError> {
        info!("Starting another verification");
        self.claims.reset();
        while self.callbacks.try_recv().is_ok() {}
        self.verification.reset_for_another_verification().await
    }
}
