//! Verification Session Controller
//!
//! Drives one proof request from initiation to completion.
//!
//! ```text
//!   Idle ──connect──▶ Initiating ──▶ AwaitingCompletion ──proofs──▶ Completed
//!    │                    │                  │
//!    │                    └──failure─────────┴──▶ Error ──connect──▶ Initiating
//!    │
//!    └──recover (persisted proofs)──────────────────────────────▶ Completed
//!
//!   reset: any state ──▶ Idle ──▶ Initiating
//! ```
//!
//! Proofs arrive through two producers: the session callback and the status
//! URL poll. Whichever lands first completes the session; anything arriving
//! afterwards, or carrying a superseded ticket, is ignored.

use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::core::config::AppConfig;
use crate::core::device::classify_device;
use crate::proof::artifact::ProofArtifact;
use crate::proof::context::{extract_claim_attributes, ClaimAttributes};
use crate::session::remote::{
    CallbackEvent, CallbackOutcome, CallbackSink, InitiateParams, ProofService,
    RemoteError, SessionTicket, StatusPoller,
};
use crate::session::store::{SessionStore, StoreError};

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    /// Nothing started.
    Idle,
    /// Waiting for the service to hand out a request.
    Initiating,
    /// Request URL exposed, waiting for proofs.
    AwaitingCompletion,
    /// Proofs held.
    Completed,
    /// Remote failure; user must re-trigger.
    Error,
}

/// Session lifecycle as seen by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No session yet.
    Uninitialized,
    /// User still has to complete the proof.
    AwaitingUser,
    /// Proof available.
    Completed,
    /// Session failed.
    Failed,
}

impl VerificationState {
    /// Map to the user-facing session status.
    pub fn session_status(self) -> SessionStatus {
        match self {
            VerificationState::Idle => SessionStatus::Uninitialized,
            VerificationState::Initiating | VerificationState::AwaitingCompletion => {
                SessionStatus::AwaitingUser
            }
            VerificationState::Completed => SessionStatus::Completed,
            VerificationState::Error => SessionStatus::Failed,
        }
    }
}

/// Controller errors.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    /// Remote service failure.
    #[error("remote: {0}")]
    Remote(#[from] RemoteError),

    /// Recovery store failure.
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

/// Proof-request parameters.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    /// Application id.
    pub app_id: String,
    /// Application secret.
    pub app_secret: String,
    /// Data provider id.
    pub provider_id: String,
    /// Redirect URL for mobile flows.
    pub redirect_url: String,
    /// Client user agent.
    pub user_agent: String,
    /// Client exposes a screen orientation.
    pub has_orientation: bool,
}

impl From<&AppConfig> for VerificationConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            provider_id: config.provider_id.clone(),
            redirect_url: config.redirect_url.clone(),
            user_agent: config.user_agent.clone(),
            has_orientation: false,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// The verification session state machine.
pub struct VerificationController {
    config: VerificationConfig,
    service: Arc<dyn ProofService>,
    poller: Arc<dyn StatusPoller>,
    store: Arc<dyn SessionStore>,
    callbacks: mpsc::UnboundedSender<CallbackEvent>,
    state: VerificationState,
    /// Present only while awaiting completion.
    request_url: Option<String>,
    /// Identity of the current session.
    ticket: Option<SessionTicket>,
    proofs: Vec<ProofArtifact>,
    attributes: ClaimAttributes,
    /// The persisted status URL has been polled since startup.
    recovery_checked: bool,
    last_error: Option<String>,
}

impl VerificationController {
    /// Create a controller. Session callbacks are delivered on `callbacks`.
    pub fn new(
        config: VerificationConfig,
        service: Arc<dyn ProofService>,
        poller: Arc<dyn StatusPoller>,
        store: Arc<dyn SessionStore>,
        callbacks: mpsc::UnboundedSender<CallbackEvent>,
    ) -> Self {
        Self {
            config,
            service,
            poller,
            store,
            callbacks,
            state: VerificationState::Idle,
            request_url: None,
            ticket: None,
            proofs: Vec::new(),
            attributes: ClaimAttributes::default(),
            recovery_checked: false,
            last_error: None,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// Current state.
    pub fn state(&self) -> VerificationState {
        self.state
    }

    /// URL to show the user; only while awaiting completion.
    pub fn request_url(&self) -> Option<&str> {
        match self.state {
            VerificationState::AwaitingCompletion => self.request_url.as_deref(),
            _ => None,
        }
    }

    /// Persisted status URL.
    pub fn status_url(&self) -> Result<Option<String>, StoreError> {
        self.store.load()
    }

    /// Identity of the current session.
    pub fn ticket(&self) -> Option<&SessionTicket> {
        self.ticket.as_ref()
    }

    /// All proofs held.
    pub fn proofs(&self) -> &[ProofArtifact] {
        &self.proofs
    }

    /// The proof a claim is made with.
    pub fn primary_proof(&self) -> Option<&ProofArtifact> {
        self.proofs.first()
    }

    /// Parsed claim attributes; unset when parsing failed.
    pub fn claim_attributes(&self) -> &ClaimAttributes {
        &self.attributes
    }

    /// Message of the last failure, cleared on the next attempt.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    /// Wallet connected: recover a persisted session or start a new one.
    #[instrument(skip(self))]
    pub async fn connect(&mut self) -> Result<(), VerificationError> {
        match self.state {
            VerificationState::Completed => return Ok(()),
            VerificationState::Initiating | VerificationState::AwaitingCompletion => {
                debug!("Verification already in flight");
                return Ok(());
            }
            VerificationState::Idle | VerificationState::Error => {}
        }

        if !self.recovery_checked && self.recover().await? {
            return Ok(());
        }

        self.initiate().await
    }

    /// Poll the persisted status URL once.
    ///
    /// Returns whether the session completed. Poll failures are logged and
    /// reported as "no proofs".
    #[instrument(skip(self))]
    pub async fn recover(&mut self) -> Result<bool, VerificationError> {
        if self.state == VerificationState::Completed {
            return Ok(true);
        }
        if matches!(self.state, VerificationState::Initiating | VerificationState::AwaitingCompletion) {
            return Ok(false);
        }

        self.recovery_checked = true;
        let Some(status_url) = self.status_url()? else {
            debug!("No persisted session to recover");
            return Ok(false);
        };

        info!("Recovering session from {}", status_url);
        let proofs = match self.poller.fetch_status(&status_url).await {
            Ok(response) => response.into_proofs(),
            Err(e) => {
                warn!("Error fetching proofs from {}: {}", status_url, e);
                return Ok(false);
            }
        };

        if proofs.is_empty() {
            debug!("Persisted session has no proofs yet");
            return Ok(false);
        }

        self.ticket = Some(SessionTicket::issue(&status_url));
        self.complete(proofs);
        Ok(true)
    }

    /// Request a fresh request/status URL pair and start the remote session.
    ///
    /// No-op while an initiation is in flight or a proof is held.
    #[instrument(skip(self))]
    pub async fn initiate(&mut self) -> Result<(), VerificationError> {
        match self.state {
            VerificationState::Initiating | VerificationState::AwaitingCompletion => {
                debug!("Initiation already in flight, not requesting another");
                return Ok(());
            }
            VerificationState::Completed => {
                debug!("Proof already held, reset before verifying again");
                return Ok(());
            }
            VerificationState::Idle | VerificationState::Error => {}
        }

        self.state = VerificationState::Initiating;
        self.last_error = None;

        let device = classify_device(&self.config.user_agent, self.config.has_orientation);
        let params = InitiateParams {
            app_id: self.config.app_id.clone(),
            app_secret: self.config.app_secret.clone(),
            provider_id: self.config.provider_id.clone(),
            device,
            use_app_clip: device.use_app_clip(),
            redirect_url: device.needs_redirect().then(|| self.config.redirect_url.clone()),
        };
        info!("Initiating verification for {} device", device.as_str());

        let request = match self.service.initiate(&params).await {
            Ok(request) => request,
            Err(e) => return Err(self.fail(e.into())),
        };

        if let Err(e) = self.store.save(&request.status_url) {
            return Err(self.fail(e.into()));
        }

        let ticket = SessionTicket::issue(&request.status_url);
        info!("Session {} awaiting user", ticket.session_id);
        self.ticket = Some(ticket.clone());
        self.request_url = Some(request.request_url.clone());
        self.state = VerificationState::AwaitingCompletion;

        let sink = CallbackSink::new(ticket, self.callbacks.clone());
        if let Err(e) = self.service.start_session(&request, sink).await {
            return Err(self.fail(e.into()));
        }

        Ok(())
    }

    /// Apply a session callback.
    ///
    /// Returns whether it changed the state. Callbacks from superseded
    /// sessions, or arriving after the session resolved, are ignored.
    pub fn handle_callback(&mut self, event: CallbackEvent) -> bool {
        if self.ticket.as_ref() != Some(&event.ticket) {
            debug!("Ignoring callback from superseded session {}", event.ticket.session_id);
            return false;
        }
        if self.state != VerificationState::AwaitingCompletion {
            debug!("Ignoring callback in state {:?}", self.state);
            return false;
        }

        match event.outcome {
            CallbackOutcome::Success(payload) => match payload.into_proofs() {
                None => {
                    debug!("Ignoring non-proof callback payload");
                    false
                }
                Some(proofs) if proofs.is_empty() => {
                    debug!("Ignoring empty proof list");
                    false
                }
                Some(proofs) => {
                    self.complete(proofs);
                    true
                }
            },
            CallbackOutcome::Failure(message) => {
                self.fail(RemoteError::Session(message).into());
                true
            }
        }
    }

    /// Poll the status URL while awaiting completion.
    ///
    /// Races the session callback; returns whether this poll completed the
    /// session.
    #[instrument(skip(self))]
    pub async fn poll_status(&mut self) -> Result<bool, VerificationError> {
        if self.state != VerificationState::AwaitingCompletion {
            return Ok(false);
        }
        let Some(status_url) = self.status_url()? else {
            return Ok(false);
        };

        let proofs = match self.poller.fetch_status(&status_url).await {
            Ok(response) => response.into_proofs(),
            Err(e) => {
                warn!("Status poll of {} failed: {}", status_url, e);
                return Ok(false);
            }
        };

        if proofs.is_empty() {
            return Ok(false);
        }
        self.complete(proofs);
        Ok(true)
    }

    /// Discard the current session and start a new one.
    #[instrument(skip(self))]
    pub async fn reset_for_another_verification(&mut self) -> Result<(), VerificationError> {
        info!("Resetting for another verification");
        self.store.clear()?;
        self.proofs.clear();
        self.attributes = ClaimAttributes::default();
        self.request_url = None;
        self.ticket = None;
        self.last_error = None;
        self.recovery_checked = true;
        self.state = VerificationState::Idle;

        self.initiate().await
    }

    fn complete(&mut self, proofs: Vec<ProofArtifact>) {
        let attributes = proofs
            .first()
            .map(extract_claim_attributes)
            .unwrap_or_default();

        info!(
            "Verification complete: {} proof(s), username {:?}, followers {:?}",
            proofs.len(),
            attributes.username,
            attributes.followers_count,
        );

        self.proofs = proofs;
        self.attributes = attributes;
        self.request_url = None;
        self.last_error = None;
        self.state = VerificationState::Completed;
    }

    fn fail(&mut self, err: VerificationError) -> VerificationError {
        error!("Verification failed: {}", err);
        self.request_url = None;
        self.last_error = Some(err.to_string());
        self.state = VerificationState::Error;
        err
    }
}
