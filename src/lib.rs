//! # Cloutcoin Claim Core
//!
//! Proves a social-media follower count through an external proof service
//! and mints the matching token reward on-chain.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CLOUTCOIN CLAIM                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Shared primitives                        │
//! │  ├── config.rs   - Application config (defaults + env)      │
//! │  ├── device.rs   - Desktop / iOS / Android classification   │
//! │  └── types.rs    - Address, TxHash, Balance                 │
//! │                                                             │
//! │  session/        - Verification session                     │
//! │  ├── controller.rs - Initiate / recover / complete          │
//! │  ├── remote.rs   - Proof service, status poller, callbacks  │
//! │  └── store.rs    - Persisted status URL                     │
//! │                                                             │
//! │  proof/          - Proof handling                           │
//! │  ├── artifact.rs - Service proof schema                     │
//! │  ├── context.rs  - Username / follower extraction           │
//! │  └── transform.rs- Contract proof struct and mint calldata  │
//! │                                                             │
//! │  claim/          - Token claim                              │
//! │  ├── eligibility.rs - Mintable amount, already claimed      │
//! │  ├── controller.rs  - Mint and confirmation                 │
//! │  └── wallet.rs   - Wallet / chain interface                 │
//! │                                                             │
//! │  app.rs          - Wiring and the user-facing snapshot      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Session Resolution
//!
//! A session resolves exactly once. Proofs may arrive through the session
//! callback or through a poll of the persisted status URL; the first to land
//! completes the session and later deliveries are dropped. Callbacks carry
//! the ticket of the session that issued them, so a reset never lets an old
//! session's result leak into the new one.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod app;
pub mod claim;
pub mod core;
pub mod proof;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use app::{ClaimApp, ClaimView};
pub use claim::{ClaimController, ClaimError, Eligibility, Wallet};
pub use core::{AppConfig, Address, Balance, TxHash};
pub use proof::{transform, OnchainProof, ProofArtifact};
pub use session::{VerificationController, VerificationState, SessionStore, FileSessionStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP timeout for status requests (seconds)
pub const HTTP_TIMEOUT_SECS: u64 = 30;
