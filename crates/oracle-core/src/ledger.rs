//! Ledger boundary contract.
//!
//! The ledger durably records attestations outside this crate. Submission is
//! best-effort: its outcome is reported on the result, never raised as an error.

use crate::error::LedgerError;
use crate::signer::keccak256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Fixed-point scale used for on-ledger scores (18 decimals).
pub const SCORE_SCALE: f64 = 1e18;

/// Attestation handed to the ledger boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttestationSubmission {
    pub submission_id: String,
    pub commitment_root: String,
    pub oracle_address: String,
    pub signature: String,
    pub existence_score: f64,
    pub ownership_score: f64,
    pub is_mock: bool,
}

#[async_trait]
pub trait LedgerBoundary: Send + Sync {
    fn ledger_id(&self) -> &'static str;

    /// Record the attestation. Returns a transaction reference.
    async fn submit_attestation(
        &self,
        attestation: &AttestationSubmission,
    ) -> Result<String, LedgerError>;
}

/// How the aggregator waits on the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LedgerDispatch {
    /// Await the boundary before returning the result.
    #[default]
    Blocking,
    /// Spawn the submission and return immediately.
    Detached,
}

/// Ledger branch taken by one verification pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LedgerSubmission {
    Submitted { ledger: String, tx_reference: String },
    Dispatched { ledger: String },
    Skipped,
    Failed { ledger: String, reason: String },
}

impl LedgerSubmission {
    pub fn transaction_reference(&self) -> Option<&str> {
        match self {
            LedgerSubmission::Submitted { tx_reference, .. } => Some(tx_reference),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LedgerSubmission::Failed { .. })
    }
}

/// Asset-registry registration parameters derived from an attestation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryRecord {
    /// 32-byte asset fingerprint, `0x` hex.
    pub fingerprint: String,
    /// Registered owner. Currently the oracle's own address, not the claimant.
    pub owner: String,
    /// 32-byte commitment root, `0x` hex.
    pub commitment_root: String,
    /// Reserved document-bundle hash, always zero.
    pub document_bundle_hash: String,
    /// `[existence, ownership, 0, 0]` at 18 decimals.
    pub scores: [u128; 4],
    pub eligible: bool,
    pub is_mock: bool,
}

impl RegistryRecord {
    pub fn from_submission(attestation: &AttestationSubmission) -> Result<Self, LedgerError> {
        let root = hex::decode(attestation.commitment_root.trim_start_matches("0x"))
            .map_err(|e| LedgerError::InvalidAttestation(format!("commitment root: {e}")))?;
        if root.len() != 32 {
            return Err(LedgerError::InvalidAttestation(format!(
                "commitment root must be 32 bytes, got {}",
                root.len()
            )));
        }

        Ok(Self {
            fingerprint: format!("0x{}", hex::encode(fingerprint(&attestation.submission_id))),
            owner: attestation.oracle_address.clone(),
            commitment_root: format!("0x{}", hex::encode(root)),
            document_bundle_hash: format!("0x{}", hex::encode([0u8; 32])),
            scores: [
                to_fixed_point(attestation.existence_score),
                to_fixed_point(attestation.ownership_score),
                0,
                0,
            ],
            eligible: true,
            is_mock: attestation.is_mock,
        })
    }
}

/// A submission id that is already a `0x`-prefixed 32-byte hex string is used
/// as-is; anything else is hashed with Keccak-256.
pub fn fingerprint(submission_id: &str) -> [u8; 32] {
    if submission_id.len() == 66 && submission_id.starts_with("0x") {
        if let Ok(bytes) = hex::decode(&submission_id[2..]) {
            let mut out = [0u8; 32];
            out.copy_from_slice(&bytes);
            return out;
        }
    }
    keccak256(submission_id.as_bytes())
}

pub fn to_fixed_point(score: f64) -> u128 {
    if !score.is_finite() {
        return 0;
    }
    (score.clamp(0.0, 1.0) * SCORE_SCALE).round() as u128
}
