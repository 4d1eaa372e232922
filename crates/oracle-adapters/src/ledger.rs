use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oracle_core::{AttestationSubmission, LedgerBoundary, LedgerError, RegistryRecord};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// One registration in the in-memory asset registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryEntry {
    pub entry_id: String,
    pub index: u64,
    pub submission_id: String,
    pub record: RegistryRecord,
    pub signature: String,
    pub recorded_at: DateTime<Utc>,
    pub previous_hash: Option<String>,
    pub entry_hash: String,
}

impl RegistryEntry {
    /// Transaction reference returned to the oracle.
    pub fn tx_reference(&self) -> String {
        format!("0x{}", self.entry_hash)
    }
}

/// Append-only, hash-chained stand-in for the on-chain asset registry.
///
/// Each fingerprint can be registered once, mirroring the registry contract.
#[derive(Debug)]
pub struct InMemoryRegistryLedger {
    registry_address: String,
    entries: Mutex<Vec<RegistryEntry>>,
}

impl InMemoryRegistryLedger {
    pub fn new(registry_address: impl Into<String>) -> Self {
        Self {
            registry_address: registry_address.into(),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn registry_address(&self) -> &str {
        &self.registry_address
    }

    pub async fn records(&self) -> Vec<RegistryEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    pub async fn find_by_fingerprint(&self, fingerprint: &str) -> Option<RegistryEntry> {
        self.entries
            .lock()
            .await
            .iter()
            .find(|entry| entry.record.fingerprint == fingerprint)
            .cloned()
    }

    pub async fn verify_chain(&self) -> bool {
        verify_entries(&self.entries.lock().await)
    }
}

impl Default for InMemoryRegistryLedger {
    fn default() -> Self {
        Self::new("0x0000000000000000000000000000000000000000")
    }
}

#[async_trait]
impl LedgerBoundary for InMemoryRegistryLedger {
    fn ledger_id(&self) -> &'static str {
        "memory"
    }

    async fn submit_attestation(
        &self,
        attestation: &AttestationSubmission,
    ) -> Result<String, LedgerError> {
        let record = RegistryRecord::from_submission(attestation)?;

        let mut entries = self.entries.lock().await;
        if entries
            .iter()
            .any(|entry| entry.record.fingerprint == record.fingerprint)
        {
            return Err(LedgerError::Rejected(format!(
                "asset {} already registered",
                record.fingerprint
            )));
        }

        let index = entries.len() as u64;
        let recorded_at = Utc::now();
        let previous_hash = entries.last().map(|entry| entry.entry_hash.clone());
        let entry_hash = compute_entry_hash(
            index,
            &attestation.submission_id,
            &record,
            &attestation.signature,
            recorded_at,
            previous_hash.as_deref(),
        );

        let entry = RegistryEntry {
            entry_id: Uuid::new_v4().to_string(),
            index,
            submission_id: attestation.submission_id.clone(),
            record,
            signature: attestation.signature.clone(),
            recorded_at,
            previous_hash,
            entry_hash,
        };
        let tx_reference = entry.tx_reference();
        debug!(
            registry = %self.registry_address,
            index,
            tx_reference = %tx_reference,
            "asset registered"
        );
        entries.push(entry);

        Ok(tx_reference)
    }
}

/// Ledger that rejects every submission.
#[derive(Debug, Clone)]
pub struct AlwaysFailLedger {
    reason: String,
}

impl AlwaysFailLedger {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LedgerBoundary for AlwaysFailLedger {
    fn ledger_id(&self) -> &'static str {
        "always-fail"
    }

    async fn submit_attestation(
        &self,
        _attestation: &AttestationSubmission,
    ) -> Result<String, LedgerError> {
        Err(LedgerError::Unavailable {
            ledger: self.ledger_id().to_string(),
            message: self.reason.clone(),
        })
    }
}

fn verify_entries(entries: &[RegistryEntry]) -> bool {
    let mut previous_hash: Option<String> = None;
    for (expected_index, entry) in entries.iter().enumerate() {
        if entry.index != expected_index as u64 || entry.previous_hash != previous_hash {
            return false;
        }
        let expected_hash = compute_entry_hash(
            entry.index,
            &entry.submission_id,
            &entry.record,
            &entry.signature,
            entry.recorded_at,
            previous_hash.as_deref(),
        );
        if entry.entry_hash != expected_hash {
            return false;
        }
        previous_hash = Some(entry.entry_hash.clone());
    }
    true
}

fn compute_entry_hash(
    index: u64,
    submission_id: &str,
    record: &RegistryRecord,
    signature: &str,
    recorded_at: DateTime<Utc>,
    previous_hash: Option<&str>,
) -> String {
    let material = serde_json::json!({
        "index": index,
        "submission_id": submission_id,
        "record": record,
        "signature": signature,
        "recorded_at": recorded_at,
        "previous_hash": previous_hash,
    });

    let bytes = serde_json::to_vec(&material).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}
