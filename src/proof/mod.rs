//! Proof Handling
//!
//! Everything between the raw artifact delivered by the verification service
//! and the bytes handed to the minting contract.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PROOF PIPELINE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  artifact.rs  - Service proof schema, payload normalization │
//! │  context.rs   - Username / follower count extraction        │
//! │  transform.rs - Contract `Proof` struct, mint calldata      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod artifact;
pub mod context;
pub mod transform;

pub use artifact::{ProofArtifact, ProofPayload, ClaimData, WitnessData};
pub use context::{ClaimAttributes, ContextError, parse_claim_context, extract_claim_attributes};
pub use transform::{transform, OnchainProof, Proof, ClaimInfo, SignedClaim, CompleteClaimData, TransformError};
