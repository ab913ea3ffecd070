//! On-chain Proof Transform
//!
//! Converts a proof artifact into the `Proof` struct the verifier contract
//! takes as its `mint` argument:
//!
//! ```text
//! Proof {
//!     ClaimInfo   { string provider; string parameters; string context; }
//!     SignedClaim {
//!         CompleteClaimData { bytes32 identifier; address owner;
//!                             uint32 timestampS; uint32 epoch; }
//!         bytes[] signatures;
//!     }
//! }
//! ```

use alloy_primitives::{hex, Bytes, B256};
use alloy_sol_types::{sol, SolCall};
use serde::{Serialize, Deserialize};

use crate::core::types::Address;
use crate::proof::artifact::ProofArtifact;
use crate::proof::context::{parse_claim_context, ClaimAttributes, ContextError};

/// Contract function the proof is submitted to.
pub const MINT_FUNCTION: &str = "mint";

/// Transform errors. Any of these aborts the mint attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// A hex field failed to decode.
    #[error("invalid {field}: {reason}")]
    InvalidHex {
        /// Offending field.
        field: &'static str,
        /// Decode failure.
        reason: String,
    },

    /// An integer does not fit its on-chain width.
    #[error("{field} out of range: {value}")]
    OutOfRange {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: u64,
    },

    /// The proof carries no witness signatures.
    #[error("proof has no signatures")]
    NoSignatures,

    /// Encoded bytes do not decode as a proof.
    #[error("abi decode failed: {0}")]
    Abi(String),
}

sol! {
    #![sol(all_derives)]

    /// Claim description.
    #[derive(Serialize, Deserialize)]
    struct ClaimInfo {
        string provider;
        string parameters;
        string context;
    }

    /// Signed claim header.
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct CompleteClaimData {
        bytes32 identifier;
        address owner;
        uint32 timestamp_s;
        uint32 epoch;
    }

    /// Claim header plus witness signatures.
    #[derive(Serialize, Deserialize)]
    struct SignedClaim {
        CompleteClaimData claim;
        bytes[] signatures;
    }

    /// Proof in the layout the contract expects.
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Proof {
        ClaimInfo claim_info;
        SignedClaim signed_claim;
    }

    /// Mint the follower reward for a verified proof.
    function mint(Proof proof);
}

/// The `mint` argument built from a proof artifact.
pub type OnchainProof = Proof;

/// Transform a proof artifact for on-chain submission.
pub fn transform(proof: &ProofArtifact) -> Result<OnchainProof, TransformError> {
    let data = &proof.claim_data;

    let identifier = data
        .identifier
        .parse::<B256>()
        .map_err(|e| TransformError::InvalidHex { field: "identifier", reason: e.to_string() })?;
    let owner = data
        .owner
        .parse::<Address>()
        .map_err(|e| TransformError::InvalidHex { field: "owner", reason: e.to_string() })?;
    let timestamp_s = to_u32("timestampS", data.timestamp_s)?;
    let epoch = to_u32("epoch", data.epoch)?;

    if proof.signatures.is_empty() {
        return Err(TransformError::NoSignatures);
    }
    let signatures = proof
        .signatures
        .iter()
        .map(|s| {
            hex::decode(s)
                .map(Bytes::from)
                .map_err(|e| TransformError::InvalidHex { field: "signature", reason: e.to_string() })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Proof {
        claim_info: ClaimInfo {
            provider: data.provider.clone(),
            parameters: data.parameters.clone(),
            context: data.context.clone(),
        },
        signed_claim: SignedClaim {
            claim: CompleteClaimData { identifier, owner, timestamp_s, epoch },
            signatures,
        },
    })
}

fn to_u32(field: &'static str, value: u64) -> Result<u32, TransformError> {
    u32::try_from(value).map_err(|_| TransformError::OutOfRange { field, value })
}

impl Proof {
    /// ABI encoding as the sole `mint` argument, without the selector.
    pub fn abi_encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        mintCall { proof: self.clone() }.abi_encode_raw(&mut out);
        out
    }

    /// Inverse of [`Proof::abi_encode`].
    pub fn abi_decode(data: &[u8]) -> Result<Self, TransformError> {
        mintCall::abi_decode_raw(data)
            .map(|call| call.proof)
            .map_err(|e| TransformError::Abi(e.to_string()))
    }

    /// Calldata for `mint(Proof)`.
    pub fn mint_calldata(&self) -> Vec<u8> {
        mintCall { proof: self.clone() }.abi_encode()
    }

    /// Claim attributes carried in the encoded context.
    pub fn claim_attributes(&self) -> Result<ClaimAttributes, ContextError> {
        parse_claim_context(&self.claim_info.context)
    }
}
