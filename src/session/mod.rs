//! Verification Session
//!
//! Obtains a proof of the user's social profile from the external proof
//! service and survives page reloads through a persisted status URL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  VERIFICATION SESSION                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  controller.rs - State machine, dual discovery path         │
//! │  remote.rs     - Proof service, status poller, callbacks    │
//! │  store.rs      - Persisted status URL (memory / file)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod controller;
pub mod remote;
pub mod store;

pub use controller::{
    VerificationController, VerificationConfig, VerificationState, VerificationError,
    SessionStatus,
};
pub use remote::{
    ProofService, StatusPoller, HttpStatusPoller, InitiateParams, ProofRequest, RemoteError,
    SessionId, SessionTicket, CallbackSink, CallbackEvent, CallbackOutcome, StatusResponse,
    callback_channel,
};
pub use store::{SessionStore, MemorySessionStore, FileSessionStore, StoreError, STATUS_URL_KEY};
