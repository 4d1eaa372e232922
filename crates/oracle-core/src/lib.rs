//! PropToken oracle core.
//!
//! Runs independent verification checks over an asset claim, commits the
//! collected signals into a single digest, signs the digest with the oracle key
//! and hands the attestation to an optional ledger boundary.

#![deny(unsafe_code)]

pub mod aggregator;
pub mod checks;
pub mod commitment;
pub mod error;
pub mod ledger;
pub mod providers;
pub mod signer;
pub mod types;

pub use aggregator::OracleAggregator;
pub use checks::{ActivityCheck, ExistenceCheck, OwnershipCheck, VerificationCheck};
pub use commitment::{build_commitment, commitment_root};
pub use error::{LedgerError, OracleError, ProviderError};
pub use ledger::{
    AttestationSubmission, LedgerBoundary, LedgerDispatch, LedgerSubmission, RegistryRecord,
};
pub use providers::{CompanyRegistry, ImageClassifier, ImageryProvider};
pub use signer::{recover_address, verify_attestation, AttestationSigner};
pub use types::{
    AttestationData, CheckKind, CheckResult, Coordinates, DocumentData, FinancialData, Location,
    OracleResult, SignalData, SignalKind, SignalMap, SpvData, SubmissionData, PASS_THRESHOLD,
};
