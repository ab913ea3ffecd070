//! Claim Context Parsing
//!
//! Extracts the disclosed username and follower count from the JSON string
//! embedded in a proof. Failures here are never fatal: callers get
//! [`ClaimAttributes::default`] and a warning in the log.

use serde::{Serialize, Deserialize};
use serde_json::Value;
use tracing::warn;

use crate::proof::artifact::ProofArtifact;

/// Context parse errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// Context is not valid JSON.
    #[error("claim context is not valid JSON: {0}")]
    InvalidJson(String),

    /// No `extractedParameters` object.
    #[error("claim context has no extractedParameters")]
    MissingParameters,

    /// `followers_count` is present but not a non-negative integer.
    #[error("invalid followers_count: {0}")]
    InvalidFollowersCount(String),
}

/// Attributes disclosed by a proof.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimAttributes {
    /// Account screen name.
    pub username: Option<String>,
    /// Follower count at proof time.
    pub followers_count: Option<u64>,
}

impl ClaimAttributes {
    /// Both attributes are known.
    pub fn is_complete(&self) -> bool {
        self.username.is_some() && self.followers_count.is_some()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawContext {
    extracted_parameters: Option<serde_json::Map<String, Value>>,
}

/// Parse a claim context string.
///
/// Username and follower count are read independently; a malformed count
/// leaves only `followers_count` unset.
pub fn parse_claim_context(context: &str) -> Result<ClaimAttributes, ContextError> {
    let raw: RawContext = serde_json::from_str(context)
        .map_err(|e| ContextError::InvalidJson(e.to_string()))?;
    let params = raw.extracted_parameters.ok_or(ContextError::MissingParameters)?;

    let username = params
        .get("screen_name")
        .and_then(Value::as_str)
        .map(str::to_string);

    let followers_count = match params.get("followers_count") {
        None | Some(Value::Null) => None,
        Some(value) => match parse_count(value) {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Ignoring follower count of {:?}: {}", username, e);
                None
            }
        },
    };

    Ok(ClaimAttributes { username, followers_count })
}

fn parse_count(value: &Value) -> Result<u64, ContextError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| ContextError::InvalidFollowersCount(n.to_string())),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| ContextError::InvalidFollowersCount(s.clone())),
        other => Err(ContextError::InvalidFollowersCount(other.to_string())),
    }
}

/// Extract attributes from a proof, logging and discarding parse failures.
pub fn extract_claim_attributes(proof: &ProofArtifact) -> ClaimAttributes {
    let context = proof.claim_context();
    if context.is_empty() {
        warn!("Proof {} carries no claim context", proof.identifier);
        return ClaimAttributes::default();
    }

    match parse_claim_context(context) {
        Ok(attributes) => attributes,
        Err(e) => {
            warn!("Error parsing claim context of proof {}: {}", proof.identifier, e);
            ClaimAttributes::default()
        }
    }
}
