//! Flat content commitment over the collected signal set.
//!
//! Leaves are `"<namespace>:<key>:<score>"` strings. They are sorted byte-wise,
//! concatenated without a separator and hashed once with SHA-256. The root is the
//! lowercase hex digest. This binds the full set against tampering but is not a
//! Merkle tree: there are no per-leaf inclusion proofs.

use crate::types::{CheckKind, CheckResult, SignalKind};
use sha2::{Digest, Sha256};

/// Shortest decimal that round-trips to the same `f64` (`1.0` renders as `1`).
///
/// Always positional: `0.00001` stays `0.00001`, never `1e-5`. Verifiers that
/// render floats with an exponent for small magnitudes must normalise first.
pub fn format_score(score: f64) -> String {
    format!("{}", score)
}

pub fn leaf(namespace: CheckKind, key: SignalKind, score: f64) -> String {
    format!(
        "{}:{}:{}",
        namespace.as_str(),
        key.as_str(),
        format_score(score)
    )
}

/// Flatten the committed checks' signals into leaf strings.
///
/// Checks whose kind is not committed are skipped.
pub fn collect_leaves(checks: &[&CheckResult]) -> Vec<String> {
    checks
        .iter()
        .filter(|check| check.kind.is_committed())
        .flat_map(|check| {
            check
                .signals
                .iter()
                .map(move |(key, signal)| leaf(check.kind, *key, signal.score))
        })
        .collect()
}

/// Commitment root over an arbitrary leaf collection.
///
/// Returns an empty string for an empty collection.
pub fn commitment_root<S: AsRef<str>>(leaves: &[S]) -> String {
    if leaves.is_empty() {
        return String::new();
    }

    let mut sorted: Vec<&str> = leaves.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for leaf in sorted {
        hasher.update(leaf.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Commitment root over `(namespace, key, score)` triples.
pub fn build_commitment(signals: &[(CheckKind, SignalKind, f64)]) -> String {
    let leaves: Vec<String> = signals
        .iter()
        .map(|(namespace, key, score)| leaf(*namespace, *key, *score))
        .collect();
    commitment_root(&leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SignalData, SignalMap};

    #[test]
    fn scores_render_shortest() {
        assert_eq!(format_score(1.0), "1");
        assert_eq!(format_score(0.0), "0");
        assert_eq!(format_score(0.6), "0.6");
        assert_eq!(format_score(0.925), "0.925");
    }

    #[test]
    fn tiny_scores_render_without_exponent() {
        assert_eq!(format_score(1e-5), "0.00001");
        assert_eq!(format_score(0.0001), "0.0001");
        assert_eq!(
            leaf(CheckKind::Existence, SignalKind::VisionAnalysis, 1e-5),
            "existence:vision_analysis:0.00001"
        );
    }

    #[test]
    fn leaf_format() {
        assert_eq!(
            leaf(CheckKind::Ownership, SignalKind::DeedIntegrity, 1.0),
            "ownership:deed_integrity:1"
        );
    }

    #[test]
    fn empty_input_has_empty_root() {
        assert_eq!(build_commitment(&[]), "");
        assert_eq!(commitment_root::<String>(&[]), "");
    }

    #[test]
    fn root_is_sha256_of_sorted_concatenation() {
        let root = build_commitment(&[
            (CheckKind::Ownership, SignalKind::McaRegistry, 1.0),
            (CheckKind::Existence, SignalKind::SatelliteImage, 1.0),
        ]);
        let expected = hex::encode(Sha256::digest(
            b"existence:satellite_image:1ownership:mca_registry:1",
        ));
        assert_eq!(root, expected);
        assert_eq!(root.len(), 64);
    }

    #[test]
    fn score_change_changes_root() {
        let a = build_commitment(&[(CheckKind::Existence, SignalKind::VisionAnalysis, 0.9)]);
        let b = build_commitment(&[(CheckKind::Existence, SignalKind::VisionAnalysis, 0.91)]);
        assert_ne!(a, b);
    }

    #[test]
    fn activity_signals_are_not_collected() {
        let mut activity_signals = SignalMap::new();
        activity_signals.insert(
            SignalKind::FootTraffic,
            SignalData::new("places", 0.9, serde_json::Value::Null),
        );
        let activity = CheckResult::new(CheckKind::Activity, 0.9, activity_signals);

        let mut ownership_signals = SignalMap::new();
        ownership_signals.insert(
            SignalKind::DeedIntegrity,
            SignalData::new("HashRegistry", 0.0, serde_json::Value::Null),
        );
        let ownership = CheckResult::new(CheckKind::Ownership, 0.0, ownership_signals);

        let leaves = collect_leaves(&[&activity, &ownership]);
        assert_eq!(leaves, vec!["ownership:deed_integrity:0".to_string()]);
    }
}
