use crate::checks::{ActivityCheck, VerificationCheck};
use crate::commitment::{collect_leaves, commitment_root};
use crate::error::OracleError;
use crate::ledger::{AttestationSubmission, LedgerBoundary, LedgerDispatch, LedgerSubmission};
use crate::signer::AttestationSigner;
use crate::types::{AttestationData, CheckKind, OracleResult, SubmissionData};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Verification pipeline: checks, commitment, signature, ledger hand-off.
///
/// Holds no per-submission state; one instance serves concurrent calls.
pub struct OracleAggregator {
    existence: Arc<dyn VerificationCheck>,
    ownership: Arc<dyn VerificationCheck>,
    activity: Arc<dyn VerificationCheck>,
    signer: Arc<AttestationSigner>,
    ledger: Option<Arc<dyn LedgerBoundary>>,
    dispatch: LedgerDispatch,
}

impl OracleAggregator {
    /// Wire a pipeline with the placeholder activity check and no ledger.
    pub fn new(
        existence: Arc<dyn VerificationCheck>,
        ownership: Arc<dyn VerificationCheck>,
        signer: Arc<AttestationSigner>,
    ) -> Result<Self, OracleError> {
        expect_slot(existence.as_ref(), CheckKind::Existence)?;
        expect_slot(ownership.as_ref(), CheckKind::Ownership)?;

        Ok(Self {
            existence,
            ownership,
            activity: Arc::new(ActivityCheck),
            signer,
            ledger: None,
            dispatch: LedgerDispatch::default(),
        })
    }

    pub fn with_activity(
        mut self,
        activity: Arc<dyn VerificationCheck>,
    ) -> Result<Self, OracleError> {
        expect_slot(activity.as_ref(), CheckKind::Activity)?;
        self.activity = activity;
        Ok(self)
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn LedgerBoundary>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_dispatch(mut self, dispatch: LedgerDispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn oracle_address(&self) -> &str {
        self.signer.address()
    }

    pub fn ledger_id(&self) -> Option<&'static str> {
        self.ledger.as_ref().map(|ledger| ledger.ledger_id())
    }

    pub fn dispatch(&self) -> LedgerDispatch {
        self.dispatch
    }

    /// Run one verification pass.
    ///
    /// Fails only when the attestation cannot be signed.
    pub async fn verify_submission(
        &self,
        submission: &SubmissionData,
    ) -> Result<OracleResult, OracleError> {
        // All three checks must finish before anything is committed.
        let (existence, ownership, activity) = tokio::join!(
            self.existence.verify(submission),
            self.ownership.verify(submission),
            self.activity.verify(submission),
        );

        let leaves = collect_leaves(&[&existence, &ownership, &activity]);
        let root = commitment_root(&leaves);

        let signature = self.signer.sign(&root, &submission.id).map_err(|err| {
            error!(submission_id = %submission.id, error = %err, "attestation signing failed");
            err
        })?;

        let attestation = AttestationData {
            commitment_root: root,
            oracle_address: self.signer.address().to_string(),
            signature,
            timestamp: Utc::now(),
        };

        let ledger = self
            .submit_to_ledger(AttestationSubmission {
                submission_id: submission.id.clone(),
                commitment_root: attestation.commitment_root.clone(),
                oracle_address: attestation.oracle_address.clone(),
                signature: attestation.signature.clone(),
                existence_score: existence.score,
                ownership_score: ownership.score,
                is_mock: submission.is_mock,
            })
            .await;

        info!(
            submission_id = %submission.id,
            commitment_root = %attestation.commitment_root,
            existence = existence.score,
            ownership = ownership.score,
            activity = activity.score,
            "submission verified"
        );

        Ok(OracleResult {
            submission_id: submission.id.clone(),
            existence,
            ownership,
            activity,
            attestation,
            ledger,
            timestamp: Utc::now(),
        })
    }

    async fn submit_to_ledger(&self, attestation: AttestationSubmission) -> LedgerSubmission {
        let Some(ledger) = self.ledger.clone() else {
            return LedgerSubmission::Skipped;
        };
        let ledger_id = ledger.ledger_id().to_string();

        match self.dispatch {
            LedgerDispatch::Blocking => submit_once(ledger.as_ref(), &attestation).await,
            LedgerDispatch::Detached => {
                // Outcome is only logged; retries belong to the ledger boundary.
                tokio::spawn(async move {
                    submit_once(ledger.as_ref(), &attestation).await;
                });
                LedgerSubmission::Dispatched { ledger: ledger_id }
            }
        }
    }
}

async fn submit_once(
    ledger: &dyn LedgerBoundary,
    attestation: &AttestationSubmission,
) -> LedgerSubmission {
    let ledger_id = ledger.ledger_id().to_string();
    match ledger.submit_attestation(attestation).await {
        Ok(tx_reference) => {
            info!(
                submission_id = %attestation.submission_id,
                ledger = %ledger_id,
                tx_reference = %tx_reference,
                "attestation recorded on ledger"
            );
            LedgerSubmission::Submitted {
                ledger: ledger_id,
                tx_reference,
            }
        }
        Err(err) => {
            warn!(
                submission_id = %attestation.submission_id,
                ledger = %ledger_id,
                error = %err,
                "ledger submission failed"
            );
            LedgerSubmission::Failed {
                ledger: ledger_id,
                reason: err.to_string(),
            }
        }
    }
}

fn expect_slot(check: &dyn VerificationCheck, expected: CheckKind) -> Result<(), OracleError> {
    if check.kind() != expected {
        return Err(OracleError::slot_mismatch(
            expected.as_str(),
            check.kind().as_str(),
        ));
    }
    Ok(())
}
