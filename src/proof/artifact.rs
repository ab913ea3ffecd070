//! Proof Artifacts
//!
//! Wire schema of the proofs produced by the remote verification service,
//! as delivered through the session callback or the status endpoint.

use serde::{Serialize, Deserialize, Deserializer};

/// Claim data signed by the witnesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimData {
    /// Data provider name (e.g. `http`).
    pub provider: String,
    /// Provider parameters (JSON string).
    pub parameters: String,
    /// Owner address of the claim (hex).
    pub owner: String,
    /// Claim timestamp, Unix seconds.
    #[serde(deserialize_with = "lenient_u64")]
    pub timestamp_s: u64,
    /// Embedded context (JSON string) carrying the extracted parameters.
    #[serde(default)]
    pub context: String,
    /// Claim identifier (hex, 32 bytes).
    pub identifier: String,
    /// Witness epoch.
    #[serde(deserialize_with = "lenient_u64")]
    pub epoch: u64,
}

/// Witness that attested the claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessData {
    /// Witness address.
    pub id: String,
    /// Witness endpoint.
    pub url: String,
}

/// A single proof artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofArtifact {
    /// Proof identifier (hex).
    pub identifier: String,
    /// Signed claim payload.
    pub claim_data: ClaimData,
    /// Witness signatures over the claim (hex).
    #[serde(default)]
    pub signatures: Vec<String>,
    /// Witnesses that produced the signatures.
    #[serde(default)]
    pub witnesses: Vec<WitnessData>,
    /// Extracted parameter values, when the service reports them separately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_parameter_values: Option<serde_json::Value>,
    /// Application-defined public data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_data: Option<serde_json::Value>,
}

impl ProofArtifact {
    /// The embedded claim context string.
    pub fn claim_context(&self) -> &str {
        &self.claim_data.context
    }
}

/// Success payload of a session callback.
///
/// The service sends either one proof, a list of proofs, or a plain string
/// for non-proof messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ProofPayload {
    /// A list of proofs.
    Many(Vec<ProofArtifact>),
    /// A single proof.
    Single(Box<ProofArtifact>),
    /// A non-proof message.
    Message(String),
}

impl ProofPayload {
    /// Normalize into an ordered sequence of proofs.
    ///
    /// Returns `None` for message payloads.
    pub fn into_proofs(self) -> Option<Vec<ProofArtifact>> {
        match self {
            ProofPayload::Many(proofs) => Some(proofs),
            ProofPayload::Single(proof) => Some(vec![*proof]),
            ProofPayload::Message(_) => None,
        }
    }
}

impl From<ProofArtifact> for ProofPayload {
    fn from(proof: ProofArtifact) -> Self {
        ProofPayload::Single(Box::new(proof))
    }
}

impl From<Vec<ProofArtifact>> for ProofPayload {
    fn from(proofs: Vec<ProofArtifact>) -> Self {
        ProofPayload::Many(proofs)
    }
}

/// Accept integers encoded as JSON numbers or decimal strings.
fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        Text(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::*;

    #[test]
    fn test_deserialize_service_json() {
        let json = serde_json::json!({
            "identifier": "0x01",
            "claimData": {
                "provider": "http",
                "parameters": "{}",
                "owner": "0x02",
                "timestampS": "1717000000",
                "context": "{}",
                "identifier": "0x01",
                "epoch": 1
            },
            "signatures": ["0x03"],
            "witnesses": [{"id": "0x04", "url": "wss://w"}],
            "publicData": null
        });

        let proof: ProofArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(proof.claim_data.timestamp_s, 1_717_000_000);
        assert_eq!(proof.claim_data.epoch, 1);
        assert_eq!(proof.witnesses.len(), 1);
        assert!(proof.public_data.is_none());
    }

    #[test]
    fn test_single_payload_normalized() {
        let proof = twitter_proof(10);
        let json = serde_json::to_value(&proof).unwrap();
        let payload: ProofPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.into_proofs(), Some(vec![proof]));
    }

    #[test]
    fn test_list_payload_keeps_order() {
        let proofs = vec![twitter_proof(1), twitter_proof(2)];
        let json = serde_json::to_value(&proofs).unwrap();
        let payload: ProofPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.into_proofs(), Some(proofs));
    }

    #[test]
    fn test_message_payload_has_no_proofs() {
        let payload: ProofPayload = serde_json::from_str("\"session started\"").unwrap();
        assert_eq!(payload.into_proofs(), None);
    }
}
