//! Cloutcoin Claim Inspector
//!
//! Recovers a verification session from its status URL, prints what the
//! user would see and the `mint` calldata ready to hand to a wallet.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use clout_claim::{
    AppConfig, ClaimApp, FileSessionStore, SessionStore, HTTP_TIMEOUT_SECS, VERSION,
    claim::{ContractCall, Receipt, Wallet, WalletError},
    core::{Address, Balance, TxHash},
    proof::transform,
    session::{CallbackSink, HttpStatusPoller, InitiateParams, MemorySessionStore, ProofRequest, ProofService, RemoteError},
};

/// Env var naming a status URL to inspect instead of the persisted one.
const STATUS_URL_VAR: &str = "CLOUT_STATUS_URL";

/// Never starts sessions; the inspector only recovers existing ones.
struct InspectOnly;

#[async_trait]
impl ProofService for InspectOnly {
    async fn initiate(&self, _params: &InitiateParams) -> Result<ProofRequest, RemoteError> {
        Err(RemoteError::Initiation("inspector does not start sessions".into()))
    }

    async fn start_session(&self, _request: &ProofRequest, _sink: CallbackSink) -> Result<(), RemoteError> {
        Err(RemoteError::Initiation("inspector does not start sessions".into()))
    }
}

/// No wallet attached.
struct Detached;

#[async_trait]
impl Wallet for Detached {
    fn is_connected(&self) -> bool {
        false
    }

    fn address(&self) -> Option<Address> {
        None
    }

    async fn submit(&self, _call: &ContractCall) -> Result<TxHash, WalletError> {
        Err(WalletError::NotConnected)
    }

    async fn watch_confirmation(&self, _hash: TxHash) -> Result<Receipt, WalletError> {
        Err(WalletError::NotConnected)
    }

    async fn observe_balance(&self, _token: Address, _owner: Address) -> Result<Balance, WalletError> {
        Err(WalletError::NotConnected)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Cloutcoin Claim v{}", VERSION);

    let config = AppConfig::from_env().context("Invalid configuration")?;
    info!("Contract: {}", config.contract_address);

    let store: Arc<dyn SessionStore> = match std::env::var(STATUS_URL_VAR) {
        Ok(url) if !url.trim().is_empty() => Arc::new(MemorySessionStore::with_status_url(url.trim())),
        _ => {
            let file_store = FileSessionStore::new(config.store_path.clone());
            info!("Reading session from {}", file_store.path().display());
            Arc::new(file_store)
        }
    };

    let Some(status_url) = store.load().context("Failed to read session store")? else {
        bail!("No session to inspect: set {} or verify first", STATUS_URL_VAR);
    };
    info!("Inspecting {}", status_url);

    let poller = HttpStatusPoller::new(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .context("Failed to build HTTP client")?;

    let mut app = ClaimApp::new(
        &config,
        Arc::new(InspectOnly),
        Arc::new(poller),
        store,
        Arc::new(Detached),
    );

    if !app.recover().await? {
        warn!("Session has no proofs yet");
    }

    println!("{}", serde_json::to_string_pretty(&app.view())?);

    if let Some(proof) = app.verification().primary_proof() {
        let onchain = transform(proof).context("Proof cannot be encoded for the contract")?;
        println!("0x{}", hex::encode(onchain.mint_calldata()));
    }

    Ok(())
}
