//! Verification checks.
//!
//! Each check combines one or more provider outputs into a [`CheckResult`] with a
//! fixed weighting. A check never fails: a provider error degrades the affected
//! signal to a score of `0.0` and the check carries on with the remaining evidence.

use crate::error::ProviderError;
use crate::providers::{CompanyRegistry, ImageClassifier, ImageryProvider};
use crate::types::{CheckKind, CheckResult, SignalData, SignalKind, SignalMap, SubmissionData};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Weight of the classification score in the existence score.
pub const EXISTENCE_CLASSIFICATION_WEIGHT: f64 = 0.7;
/// Floor granted once site imagery exists at all.
pub const EXISTENCE_IMAGERY_FLOOR: f64 = 0.3;
/// Confidence reported alongside every existence result.
pub const EXISTENCE_CONFIDENCE: f64 = 0.95;

pub const OWNERSHIP_REGISTRY_WEIGHT: f64 = 0.6;
pub const OWNERSHIP_DOCUMENT_WEIGHT: f64 = 0.4;

pub const ACTIVITY_PLACEHOLDER_SCORE: f64 = 0.9;

pub const DEED_SOURCE: &str = "HashRegistry";
pub const ACTIVITY_SOURCE: &str = "MockGooglePlaces";

/// A single verification dimension.
///
/// The aggregator depends only on this trait, so a check can be replaced
/// without touching orchestration.
#[async_trait]
pub trait VerificationCheck: Send + Sync {
    fn kind(&self) -> CheckKind;

    async fn verify(&self, submission: &SubmissionData) -> CheckResult;
}

/// `0.7 * classification + 0.3`
pub fn existence_score(classification: f64) -> f64 {
    classification * EXISTENCE_CLASSIFICATION_WEIGHT + EXISTENCE_IMAGERY_FLOOR
}

/// `0.6 * registry + 0.4 * document`
pub fn ownership_score(registry: f64, document: f64) -> f64 {
    registry * OWNERSHIP_REGISTRY_WEIGHT + document * OWNERSHIP_DOCUMENT_WEIGHT
}

fn degraded(kind: SignalKind, source: &str, err: &ProviderError) -> SignalData {
    debug!(signal = %kind, source, error = %err, "provider failed; signal degraded");
    SignalData::degraded(source, err)
}

/// Site existence via imagery lookup plus image classification.
pub struct ExistenceCheck {
    imagery: Arc<dyn ImageryProvider>,
    classifier: Arc<dyn ImageClassifier>,
}

impl ExistenceCheck {
    pub fn new(imagery: Arc<dyn ImageryProvider>, classifier: Arc<dyn ImageClassifier>) -> Self {
        Self {
            imagery,
            classifier,
        }
    }

    fn classify(&self, image_ref: &str) -> Result<f64, ProviderError> {
        let score = self.classifier.classify(image_ref)?;
        if !score.is_finite() {
            return Err(ProviderError::invalid_response(
                self.classifier.source(),
                format!("non-finite classification score {score}"),
            ));
        }
        Ok(score.clamp(0.0, 1.0))
    }
}

#[async_trait]
impl VerificationCheck for ExistenceCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Existence
    }

    async fn verify(&self, submission: &SubmissionData) -> CheckResult {
        let mut signals = SignalMap::new();
        let imagery_source = self.imagery.source();
        let classifier_source = self.classifier.source();

        let classification = match self.imagery.fetch_image(&submission.location.coordinates) {
            Ok(image_ref) => {
                signals.insert(
                    SignalKind::SatelliteImage,
                    SignalData::new(imagery_source, 1.0, Value::String(image_ref.clone())),
                );
                match self.classify(&image_ref) {
                    Ok(score) => {
                        signals.insert(
                            SignalKind::VisionAnalysis,
                            SignalData::new(
                                classifier_source,
                                score,
                                Value::String(format!(
                                    "structure detected with confidence {score:.2}"
                                )),
                            ),
                        );
                        score
                    }
                    Err(err) => {
                        signals.insert(
                            SignalKind::VisionAnalysis,
                            degraded(SignalKind::VisionAnalysis, classifier_source, &err),
                        );
                        0.0
                    }
                }
            }
            Err(err) => {
                signals.insert(
                    SignalKind::SatelliteImage,
                    degraded(SignalKind::SatelliteImage, imagery_source, &err),
                );
                // Nothing to classify without imagery.
                let skipped =
                    ProviderError::unavailable(classifier_source, "no imagery to classify");
                signals.insert(
                    SignalKind::VisionAnalysis,
                    degraded(SignalKind::VisionAnalysis, classifier_source, &skipped),
                );
                0.0
            }
        };

        CheckResult::new(CheckKind::Existence, existence_score(classification), signals)
            .with_confidence(EXISTENCE_CONFIDENCE)
    }
}

/// Ownership via registry status of the holding entity plus deed presence.
pub struct OwnershipCheck {
    registry: Arc<dyn CompanyRegistry>,
}

impl OwnershipCheck {
    pub fn new(registry: Arc<dyn CompanyRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl VerificationCheck for OwnershipCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Ownership
    }

    async fn verify(&self, submission: &SubmissionData) -> CheckResult {
        let mut signals = SignalMap::new();
        let registry_source = self.registry.source();

        let registry_score = match self.registry.verify_company(&submission.spv.reg_id) {
            Ok(active) => {
                let score = if active { 1.0 } else { 0.0 };
                signals.insert(
                    SignalKind::McaRegistry,
                    SignalData::new(registry_source, score, json!({ "active": active })),
                );
                score
            }
            Err(err) => {
                signals.insert(
                    SignalKind::McaRegistry,
                    degraded(SignalKind::McaRegistry, registry_source, &err),
                );
                0.0
            }
        };

        // Presence of a deed hash is taken as integrity for now.
        let deed_hash = &submission.documents.deed_hash;
        let document_score = if deed_hash.is_empty() { 0.0 } else { 1.0 };
        signals.insert(
            SignalKind::DeedIntegrity,
            SignalData::new(DEED_SOURCE, document_score, Value::String(deed_hash.clone())),
        );

        CheckResult::new(
            CheckKind::Ownership,
            ownership_score(registry_score, document_score),
            signals,
        )
    }
}

/// Fixed foot-traffic signal standing in for a real-time activity feed.
#[derive(Debug, Clone, Default)]
pub struct ActivityCheck;

#[async_trait]
impl VerificationCheck for ActivityCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Activity
    }

    async fn verify(&self, _submission: &SubmissionData) -> CheckResult {
        let mut signals = SignalMap::new();
        signals.insert(
            SignalKind::FootTraffic,
            SignalData::new(ACTIVITY_SOURCE, ACTIVITY_PLACEHOLDER_SCORE, Value::Null),
        );
        CheckResult::new(CheckKind::Activity, ACTIVITY_PLACEHOLDER_SCORE, signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Coordinates;

    struct Imagery(Result<String, ProviderError>);

    impl ImageryProvider for Imagery {
        fn source(&self) -> &'static str {
            "imagery"
        }

        fn fetch_image(&self, _coordinates: &Coordinates) -> Result<String, ProviderError> {
            self.0.clone()
        }
    }

    struct Classifier(Result<f64, ProviderError>);

    impl ImageClassifier for Classifier {
        fn source(&self) -> &'static str {
            "vision"
        }

        fn classify(&self, _image_ref: &str) -> Result<f64, ProviderError> {
            self.0.clone()
        }
    }

    struct Registry(Result<bool, ProviderError>);

    impl CompanyRegistry for Registry {
        fn source(&self) -> &'static str {
            "registry"
        }

        fn verify_company(&self, _reg_id: &str) -> Result<bool, ProviderError> {
            self.0.clone()
        }
    }

    fn existence(
        imagery: Result<String, ProviderError>,
        score: Result<f64, ProviderError>,
    ) -> ExistenceCheck {
        ExistenceCheck::new(Arc::new(Imagery(imagery)), Arc::new(Classifier(score)))
    }

    fn down(provider: &str) -> ProviderError {
        ProviderError::unavailable(provider, "connection refused")
    }

    #[tokio::test]
    async fn perfect_classification_passes_existence() {
        let check = existence(Ok("img://site".into()), Ok(1.0));
        let result = check.verify(&SubmissionData::new("a")).await;
        assert_eq!(result.score, 1.0);
        assert!(result.passed);
        assert_eq!(result.confidence, Some(EXISTENCE_CONFIDENCE));
        assert_eq!(result.signal_score(SignalKind::SatelliteImage), Some(1.0));
    }

    #[tokio::test]
    async fn failed_classifier_floors_existence() {
        let check = existence(Ok("img://site".into()), Err(down("vision")));
        let result = check.verify(&SubmissionData::new("a")).await;
        assert_eq!(result.score, EXISTENCE_IMAGERY_FLOOR);
        assert!(!result.passed);
        assert_eq!(result.signal_score(SignalKind::VisionAnalysis), Some(0.0));
    }

    #[tokio::test]
    async fn failed_imagery_degrades_both_signals() {
        let check = existence(Err(down("imagery")), Ok(0.99));
        let result = check.verify(&SubmissionData::new("a")).await;
        assert_eq!(result.signals.len(), 2);
        assert_eq!(result.signal_score(SignalKind::SatelliteImage), Some(0.0));
        assert_eq!(result.signal_score(SignalKind::VisionAnalysis), Some(0.0));
        assert!(result.signals[&SignalKind::SatelliteImage].data["error"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
    }

    #[tokio::test]
    async fn out_of_range_classification_is_clamped() {
        let check = existence(Ok("img".into()), Ok(3.5));
        assert_eq!(check.verify(&SubmissionData::new("a")).await.score, 1.0);

        let check = existence(Ok("img".into()), Ok(f64::NAN));
        assert_eq!(
            check.verify(&SubmissionData::new("a")).await.score,
            EXISTENCE_IMAGERY_FLOOR
        );
    }

    #[tokio::test]
    async fn missing_deed_caps_ownership_below_threshold() {
        let check = OwnershipCheck::new(Arc::new(Registry(Ok(true))));
        let submission = SubmissionData::new("a").with_registration("U1234");
        let result = check.verify(&submission).await;
        assert_eq!(result.score, 0.6);
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn registry_and_deed_pass_ownership() {
        let check = OwnershipCheck::new(Arc::new(Registry(Ok(true))));
        let submission = SubmissionData::new("a")
            .with_registration("U1234")
            .with_deed_hash("0xdeed");
        let result = check.verify(&submission).await;
        assert_eq!(result.score, 1.0);
        assert!(result.passed);
        assert_eq!(
            result.signals[&SignalKind::DeedIntegrity].data,
            Value::String("0xdeed".into())
        );
    }

    #[tokio::test]
    async fn registry_outage_keeps_deed_signal() {
        let check = OwnershipCheck::new(Arc::new(Registry(Err(down("registry")))));
        let submission = SubmissionData::new("a").with_deed_hash("0xdeed");
        let result = check.verify(&submission).await;
        assert_eq!(result.score, 0.4);
        assert_eq!(result.signal_score(SignalKind::McaRegistry), Some(0.0));
    }

    #[tokio::test]
    async fn activity_placeholder_is_fixed() {
        let result = ActivityCheck.verify(&SubmissionData::new("a")).await;
        assert_eq!(result.kind, CheckKind::Activity);
        assert_eq!(result.score, ACTIVITY_PLACEHOLDER_SCORE);
        assert!(result.passed);
        assert_eq!(result.signals.len(), 1);
    }
}
