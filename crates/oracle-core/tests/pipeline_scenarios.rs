//! End-to-end scenarios over the real checks with stub providers.

use async_trait::async_trait;
use oracle_core::{
    verify_attestation, AttestationSigner, AttestationSubmission, CompanyRegistry, Coordinates,
    ExistenceCheck, ImageClassifier, ImageryProvider, LedgerBoundary, LedgerError,
    LedgerSubmission, OracleAggregator, OwnershipCheck, ProviderError, SignalKind,
    SubmissionData,
};
use std::sync::Arc;

struct SiteImagery;

impl ImageryProvider for SiteImagery {
    fn source(&self) -> &'static str {
        "stub-imagery"
    }

    fn fetch_image(&self, coordinates: &Coordinates) -> Result<String, ProviderError> {
        Ok(format!("img://{},{}", coordinates.lat, coordinates.lng))
    }
}

struct Classifier(f64);

impl ImageClassifier for Classifier {
    fn source(&self) -> &'static str {
        "stub-vision"
    }

    fn classify(&self, _image_ref: &str) -> Result<f64, ProviderError> {
        Ok(self.0)
    }
}

/// Active whenever a registration id is present.
struct Registry;

impl CompanyRegistry for Registry {
    fn source(&self) -> &'static str {
        "stub-registry"
    }

    fn verify_company(&self, reg_id: &str) -> Result<bool, ProviderError> {
        Ok(!reg_id.is_empty())
    }
}

struct OfflineRegistry;

impl CompanyRegistry for OfflineRegistry {
    fn source(&self) -> &'static str {
        "offline-registry"
    }

    fn verify_company(&self, _reg_id: &str) -> Result<bool, ProviderError> {
        Err(ProviderError::unavailable("offline-registry", "503"))
    }
}

struct RejectingLedger;

#[async_trait]
impl LedgerBoundary for RejectingLedger {
    fn ledger_id(&self) -> &'static str {
        "rejecting"
    }

    async fn submit_attestation(
        &self,
        _attestation: &AttestationSubmission,
    ) -> Result<String, LedgerError> {
        Err(LedgerError::Rejected("asset already registered".into()))
    }
}

fn pipeline(classification: f64, registry: Arc<dyn CompanyRegistry>) -> OracleAggregator {
    let signer = AttestationSigner::from_hex(
        "0x0000000000000000000000000000000000000000000000000000000000000001",
    )
    .unwrap();
    OracleAggregator::new(
        Arc::new(ExistenceCheck::new(
            Arc::new(SiteImagery),
            Arc::new(Classifier(classification)),
        )),
        Arc::new(OwnershipCheck::new(registry)),
        Arc::new(signer),
    )
    .unwrap()
}

fn submission() -> SubmissionData {
    SubmissionData::new("asset-001")
        .with_coordinates(19.076, 72.8777)
        .with_registration("U72900MH2020PTC123456")
        .with_deed_hash("0x9f2c")
}

#[tokio::test]
async fn missing_deed_with_active_registry() {
    let submission = submission().with_deed_hash("");
    let result = pipeline(0.9, Arc::new(Registry))
        .verify_submission(&submission)
        .await
        .unwrap();

    assert_eq!(result.ownership.score, 0.6);
    assert!(!result.ownership.passed);
}

#[tokio::test]
async fn perfect_classification_passes_existence() {
    let result = pipeline(1.0, Arc::new(Registry))
        .verify_submission(&submission())
        .await
        .unwrap();

    assert_eq!(result.existence.score, 1.0);
    assert!(result.existence.passed);
    assert!(result.ownership.passed);
    assert!(result.activity.passed);
}

#[tokio::test]
async fn absent_ledger_still_signs() {
    let result = pipeline(0.9, Arc::new(Registry))
        .verify_submission(&submission())
        .await
        .unwrap();

    assert_eq!(result.ledger, LedgerSubmission::Skipped);
    assert!(result.transaction_reference().is_none());
    assert_eq!(
        result.attestation.oracle_address,
        "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
    );
    assert!(verify_attestation(&result.attestation, "asset-001"));
}

#[tokio::test]
async fn rejected_ledger_write_keeps_attestation() {
    let result = pipeline(0.9, Arc::new(Registry))
        .with_ledger(Arc::new(RejectingLedger))
        .verify_submission(&submission())
        .await
        .unwrap();

    match &result.ledger {
        LedgerSubmission::Failed { ledger, reason } => {
            assert_eq!(ledger, "rejecting");
            assert!(reason.contains("already registered"));
        }
        other => panic!("unexpected ledger outcome: {:?}", other),
    }
    assert!(verify_attestation(&result.attestation, "asset-001"));
}

#[tokio::test]
async fn registry_outage_degrades_instead_of_failing() {
    let result = pipeline(0.9, Arc::new(OfflineRegistry))
        .verify_submission(&submission())
        .await
        .unwrap();

    assert_eq!(result.ownership.score, 0.4);
    assert_eq!(
        result.ownership.signals[&SignalKind::McaRegistry].score,
        0.0
    );
}

#[tokio::test]
async fn commitment_covers_existence_and_ownership_only() {
    let pipeline = pipeline(0.9, Arc::new(Registry));
    let result = pipeline.verify_submission(&submission()).await.unwrap();

    let expected = oracle_core::build_commitment(&[
        (
            oracle_core::CheckKind::Existence,
            SignalKind::SatelliteImage,
            1.0,
        ),
        (
            oracle_core::CheckKind::Existence,
            SignalKind::VisionAnalysis,
            0.9,
        ),
        (
            oracle_core::CheckKind::Ownership,
            SignalKind::McaRegistry,
            1.0,
        ),
        (
            oracle_core::CheckKind::Ownership,
            SignalKind::DeedIntegrity,
            1.0,
        ),
    ]);
    assert_eq!(result.attestation.commitment_root, expected);
}

#[tokio::test]
async fn result_serializes_for_transport() {
    let result = pipeline(0.95, Arc::new(Registry))
        .verify_submission(&submission())
        .await
        .unwrap();

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["submission_id"], "asset-001");
    assert_eq!(value["ledger"]["status"], "skipped");
    assert!(value["existence"]["signals"]["satellite_image"].is_object());
    assert!(value["attestation"]["signature"]
        .as_str()
        .unwrap()
        .starts_with("0x"));
}
