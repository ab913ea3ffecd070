//! In-crate fakes for the collaborator traits.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::claim::wallet::{ContractCall, Receipt, ReceiptStatus, Wallet, WalletError};
use crate::core::types::{Address, Balance, TxHash, U256};
use crate::proof::artifact::ProofArtifact;
use crate::session::remote::{
    CallbackSink, InitiateParams, ProofRequest, ProofService, RemoteError, StatusPoller,
    StatusResponse, StatusSession,
};

// =============================================================================
// PROOF SERVICE
// =============================================================================

#[derive(Default)]
struct ServiceState {
    initiations: usize,
    sinks: Vec<CallbackSink>,
    fail_next: Option<String>,
    last_params: Option<InitiateParams>,
}

/// Hands out `https://request/{n}` / `https://status/session-{n}` pairs and
/// keeps every sink so tests can push callbacks.
#[derive(Default)]
pub struct FakeProofService {
    state: Mutex<ServiceState>,
}

impl FakeProofService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initiations(&self) -> usize {
        self.state.lock().unwrap().initiations
    }

    pub fn sink(&self, index: usize) -> CallbackSink {
        self.state.lock().unwrap().sinks[index].clone()
    }

    pub fn fail_next_initiation(&self, message: &str) {
        self.state.lock().unwrap().fail_next = Some(message.to_string());
    }

    pub fn last_params(&self) -> Option<InitiateParams> {
        self.state.lock().unwrap().last_params.clone()
    }
}

#[async_trait]
impl ProofService for FakeProofService {
    async fn initiate(&self, params: &InitiateParams) -> Result<ProofRequest, RemoteError> {
        let mut state = self.state.lock().unwrap();
        state.initiations += 1;
        state.last_params = Some(params.clone());
        if let Some(message) = state.fail_next.take() {
            return Err(RemoteError::Initiation(message));
        }
        let n = state.initiations;
        Ok(ProofRequest {
            request_url: format!("https://request/{}", n),
            status_url: format!("https://status/session-{}", n),
        })
    }

    async fn start_session(&self, _request: &ProofRequest, sink: CallbackSink) -> Result<(), RemoteError> {
        self.state.lock().unwrap().sinks.push(sink);
        Ok(())
    }
}

// =============================================================================
// STATUS POLLER
// =============================================================================

/// Serves canned status responses; unknown URLs answer 404.
#[derive(Default)]
pub struct FakePoller {
    responses: Mutex<HashMap<String, StatusResponse>>,
    fetches: Mutex<usize>,
}

impl FakePoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status_url: &str, response: StatusResponse) {
        self.responses.lock().unwrap().insert(status_url.to_string(), response);
    }

    pub fn with_proofs(proofs: Vec<ProofArtifact>) -> StatusResponse {
        StatusResponse {
            session: Some(StatusSession {
                status: Some("PROOF_SUBMITTED".into()),
                proofs: Some(proofs),
            }),
        }
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl StatusPoller for FakePoller {
    async fn fetch_status(&self, status_url: &str) -> Result<StatusResponse, RemoteError> {
        *self.fetches.lock().unwrap() += 1;
        self.responses
            .lock()
            .unwrap()
            .get(status_url)
            .cloned()
            .ok_or(RemoteError::Status(404))
    }
}

// =============================================================================
// WALLET
// =============================================================================

struct WalletState {
    connected: bool,
    submit_calls: usize,
    submissions: Vec<ContractCall>,
    reject_next: Option<String>,
    receipt_status: ReceiptStatus,
    confirmation_error: Option<String>,
    balance: Result<Balance, WalletError>,
}

/// Records submissions and answers with configurable receipts and balances.
pub struct FakeWallet {
    address: Address,
    state: Mutex<WalletState>,
}

impl FakeWallet {
    fn with_connection(connected: bool) -> Self {
        Self {
            address: Address::new([0x9a; 20]),
            state: Mutex::new(WalletState {
                connected,
                submit_calls: 0,
                submissions: Vec::new(),
                reject_next: None,
                receipt_status: ReceiptStatus::Success,
                confirmation_error: None,
                balance: Ok(Balance::new(U256::from(0u64), 18)),
            }),
        }
    }

    pub fn connected() -> Self {
        Self::with_connection(true)
    }

    pub fn disconnected() -> Self {
        Self::with_connection(false)
    }

    pub fn submissions(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submit_calls(&self) -> usize {
        self.state.lock().unwrap().submit_calls
    }

    pub fn reject_next_submission(&self, reason: &str) {
        self.state.lock().unwrap().reject_next = Some(reason.to_string());
    }

    pub fn set_receipt_status(&self, status: ReceiptStatus) {
        self.state.lock().unwrap().receipt_status = status;
    }

    pub fn fail_confirmation(&self, message: &str) {
        self.state.lock().unwrap().confirmation_error = Some(message.to_string());
    }

    pub fn set_balance(&self, balance: Balance) {
        self.state.lock().unwrap().balance = Ok(balance);
    }

    pub fn fail_balance(&self, message: &str) {
        self.state.lock().unwrap().balance = Err(WalletError::Rpc(message.to_string()));
    }
}

#[async_trait]
impl Wallet for FakeWallet {
    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    fn address(&self) -> Option<Address> {
        self.is_connected().then_some(self.address)
    }

    async fn submit(&self, call: &ContractCall) -> Result<TxHash, WalletError> {
        let mut state = self.state.lock().unwrap();
        state.submit_calls += 1;
        if !state.connected {
            return Err(WalletError::NotConnected);
        }
        if let Some(reason) = state.reject_next.take() {
            return Err(WalletError::Rejected(reason));
        }
        state.submissions.push(call.clone());
        Ok(TxHash::new([state.submit_calls as u8; 32]))
    }

    async fn watch_confirmation(&self, hash: TxHash) -> Result<Receipt, WalletError> {
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.confirmation_error {
            return Err(WalletError::Rpc(message.clone()));
        }
        Ok(Receipt {
            transaction_hash: hash,
            block_number: 1_000 + state.submit_calls as u64,
            status: state.receipt_status,
        })
    }

    async fn observe_balance(&self, _token: Address, owner: Address) -> Result<Balance, WalletError> {
        assert_eq!(owner, self.address);
        self.state.lock().unwrap().balance.clone()
    }
}
