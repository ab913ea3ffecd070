//! Remote Proof Service Interface
//!
//! The verification service is an external oracle. It hands out a
//! request/status URL pair, later pushes the finished proofs through a
//! session callback, and exposes the same proofs on the status URL.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::core::device::DeviceType;
use crate::proof::artifact::{ProofArtifact, ProofPayload};

/// Remote collaborator errors.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The service refused or failed to create a proof request.
    #[error("initiation failed: {0}")]
    Initiation(String),

    /// The session reported a failure.
    #[error("session failed: {0}")]
    Session(String),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Status endpoint answered with a non-success code.
    #[error("status endpoint returned {0}")]
    Status(u16),
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Parameters for a new proof request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateParams {
    /// Application id.
    pub app_id: String,
    /// Application secret.
    #[serde(skip_serializing)]
    pub app_secret: String,
    /// Data provider id.
    pub provider_id: String,
    /// Presentation mode.
    pub device: DeviceType,
    /// Use App Clip / Instant App instead of a QR code.
    pub use_app_clip: bool,
    /// Where mobile flows return afterwards.
    pub redirect_url: Option<String>,
}

/// A freshly created proof request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    /// URL the user opens or scans.
    pub request_url: String,
    /// URL for polling and recovery.
    pub status_url: String,
}

/// Remote session id, derived from the status URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Derive the id from a status URL.
    ///
    /// Status URLs end in the session id. URLs without a path fall back to a
    /// hash of the whole URL.
    pub fn from_status_url(status_url: &str) -> Self {
        let without_query = status_url.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
        let path = without_query
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(without_query);

        let segment = path
            .split('/')
            .skip(1)
            .filter(|s| !s.is_empty())
            .last();

        match segment {
            Some(s) => Self(s.to_string()),
            None => {
                let hash = Sha256::digest(status_url.as_bytes());
                Self(hex::encode(&hash[..16]))
            }
        }
    }

    /// As a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one initiation.
///
/// Every initiation gets a fresh ticket; callbacks carry the ticket they
/// were issued under so superseded sessions can be recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTicket {
    /// Local nonce, unique per initiation.
    pub nonce: Uuid,
    /// Remote session id.
    pub session_id: SessionId,
}

impl SessionTicket {
    /// Issue a ticket for a status URL.
    pub fn issue(status_url: &str) -> Self {
        Self {
            nonce: Uuid::new_v4(),
            session_id: SessionId::from_status_url(status_url),
        }
    }
}

// =============================================================================
// CALLBACKS
// =============================================================================

/// Result pushed by the remote session.
#[derive(Debug, Clone)]
pub enum CallbackOutcome {
    /// Proofs are ready.
    Success(ProofPayload),
    /// Verification failed.
    Failure(String),
}

/// A callback tagged with the ticket it belongs to.
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    /// Ticket of the originating session.
    pub ticket: SessionTicket,
    /// What happened.
    pub outcome: CallbackOutcome,
}

/// Create the channel carrying session callbacks to the controller.
pub fn callback_channel() -> (mpsc::UnboundedSender<CallbackEvent>, mpsc::UnboundedReceiver<CallbackEvent>) {
    mpsc::unbounded_channel()
}

/// Handle given to the service for delivering `onSuccess` / `onError`.
#[derive(Debug, Clone)]
pub struct CallbackSink {
    ticket: SessionTicket,
    tx: mpsc::UnboundedSender<CallbackEvent>,
}

impl CallbackSink {
    /// Create a sink bound to a ticket.
    pub fn new(ticket: SessionTicket, tx: mpsc::UnboundedSender<CallbackEvent>) -> Self {
        Self { ticket, tx }
    }

    /// Deliver proofs.
    pub fn on_success(&self, payload: impl Into<ProofPayload>) {
        self.send(CallbackOutcome::Success(payload.into()));
    }

    /// Deliver a failure.
    pub fn on_error(&self, error: impl Into<String>) {
        self.send(CallbackOutcome::Failure(error.into()));
    }

    fn send(&self, outcome: CallbackOutcome) {
        let event = CallbackEvent { ticket: self.ticket.clone(), outcome };
        if self.tx.send(event).is_err() {
            debug!("Callback for session {} dropped, controller gone", self.ticket.session_id);
        }
    }
}

// =============================================================================
// COLLABORATOR TRAITS
// =============================================================================

/// The remote proof-generation service.
#[async_trait]
pub trait ProofService: Send + Sync {
    /// Create a proof request.
    async fn initiate(&self, params: &InitiateParams) -> Result<ProofRequest, RemoteError>;

    /// Start listening for the session result; results go through `sink`.
    async fn start_session(&self, request: &ProofRequest, sink: CallbackSink) -> Result<(), RemoteError>;
}

/// Session as reported by the status endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusSession {
    /// Session status string.
    #[serde(default)]
    pub status: Option<String>,
    /// Proofs submitted so far.
    #[serde(default)]
    pub proofs: Option<Vec<ProofArtifact>>,
}

/// Status endpoint response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    /// Session, if the service still knows it.
    #[serde(default)]
    pub session: Option<StatusSession>,
}

impl StatusResponse {
    /// Proofs in the response; empty while pending.
    pub fn into_proofs(self) -> Vec<ProofArtifact> {
        self.session.and_then(|s| s.proofs).unwrap_or_default()
    }
}

/// Out-of-band status polling.
#[async_trait]
pub trait StatusPoller: Send + Sync {
    /// Fetch a status URL.
    async fn fetch_status(&self, status_url: &str) -> Result<StatusResponse, RemoteError>;
}

/// Status polling over HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpStatusPoller {
    client: reqwest::Client,
}

impl HttpStatusPoller {
    /// Create a poller with a request timeout.
    pub fn new(timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StatusPoller for HttpStatusPoller {
    async fn fetch_status(&self, status_url: &str) -> Result<StatusResponse, RemoteError> {
        let response = self.client.get(status_url).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }
        Ok(response.json().await?)
    }
}
