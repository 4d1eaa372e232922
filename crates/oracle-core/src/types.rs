use crate::ledger::LedgerSubmission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A check passes when its score is strictly greater than this value.
pub const PASS_THRESHOLD: f64 = 0.8;

/// Asset claim under evaluation, as received from the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SubmissionData {
    pub id: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub spv: SpvData,
    #[serde(default)]
    pub documents: DocumentData,
    #[serde(default)]
    pub financials: FinancialData,
    #[serde(default)]
    pub is_mock: bool,
}

impl SubmissionData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_coordinates(mut self, lat: f64, lng: f64) -> Self {
        self.location.coordinates = Coordinates { lat, lng };
        self
    }

    pub fn with_registration(mut self, reg_id: impl Into<String>) -> Self {
        self.spv.reg_id = reg_id.into();
        self
    }

    pub fn with_deed_hash(mut self, deed_hash: impl Into<String>) -> Self {
        self.documents.deed_hash = deed_hash.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Location {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Special purpose vehicle holding the asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SpvData {
    #[serde(default)]
    pub reg_id: String,
    #[serde(default)]
    pub directors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DocumentData {
    #[serde(default)]
    pub deed_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FinancialData {
    #[serde(default)]
    pub valuation: f64,
}

/// Verification dimension. Doubles as the commitment namespace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Existence,
    Ownership,
    Activity,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Existence => "existence",
            CheckKind::Ownership => "ownership",
            CheckKind::Activity => "activity",
        }
    }

    /// Whether this check's signals enter the commitment root.
    ///
    /// Activity is a synthetic placeholder and stays outside the committed set.
    pub fn is_committed(&self) -> bool {
        matches!(self, CheckKind::Existence | CheckKind::Ownership)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of evidence signals produced by the checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    SatelliteImage,
    VisionAnalysis,
    McaRegistry,
    DeedIntegrity,
    FootTraffic,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::SatelliteImage => "satellite_image",
            SignalKind::VisionAnalysis => "vision_analysis",
            SignalKind::McaRegistry => "mca_registry",
            SignalKind::DeedIntegrity => "deed_integrity",
            SignalKind::FootTraffic => "foot_traffic",
        }
    }

    pub fn check(&self) -> CheckKind {
        match self {
            SignalKind::SatelliteImage | SignalKind::VisionAnalysis => CheckKind::Existence,
            SignalKind::McaRegistry | SignalKind::DeedIntegrity => CheckKind::Ownership,
            SignalKind::FootTraffic => CheckKind::Activity,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One evidentiary fact observed by a check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalData {
    pub source: String,
    pub score: f64,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl SignalData {
    pub fn new(source: impl Into<String>, score: f64, data: Value) -> Self {
        Self {
            source: source.into(),
            score,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Signal substituted for a failed provider call.
    pub fn degraded(source: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::new(
            source,
            0.0,
            serde_json::json!({ "error": reason.to_string() }),
        )
    }
}

pub type SignalMap = BTreeMap<SignalKind, SignalData>;

/// Outcome of one verification check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub signals: SignalMap,
    pub passed: bool,
}

impl CheckResult {
    /// Build a result whose pass flag is derived from the score.
    pub fn new(kind: CheckKind, score: f64, signals: SignalMap) -> Self {
        Self {
            kind,
            score,
            confidence: None,
            signals,
            passed: score > PASS_THRESHOLD,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn signal_score(&self, kind: SignalKind) -> Option<f64> {
        self.signals.get(&kind).map(|signal| signal.score)
    }
}

/// Signed statement binding a commitment root to a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttestationData {
    pub commitment_root: String,
    pub oracle_address: String,
    pub signature: String,
    pub timestamp: DateTime<Utc>,
}

/// Final output of one verification pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OracleResult {
    pub submission_id: String,
    pub existence: CheckResult,
    pub ownership: CheckResult,
    pub activity: CheckResult,
    pub attestation: AttestationData,
    pub ledger: LedgerSubmission,
    pub timestamp: DateTime<Utc>,
}

impl OracleResult {
    pub fn checks(&self) -> [&CheckResult; 3] {
        [&self.existence, &self.ownership, &self.activity]
    }

    pub fn transaction_reference(&self) -> Option<&str> {
        self.ledger.transaction_reference()
    }
}
