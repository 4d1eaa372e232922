//! Attestation signing with a recoverable secp256k1 key.
//!
//! The signed message is `"Submission:<id>|Root:<root>"` hashed with Keccak-256.
//! Signatures are 65 bytes `r || s || v` (`v` in `{0, 1}`), hex encoded with a `0x`
//! prefix, so any verifier can recover the oracle address without the public key.

use crate::error::OracleError;
use crate::types::AttestationData;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use std::fmt;

pub const SIGNATURE_LEN: usize = 65;

pub fn attestation_message(submission_id: &str, commitment_root: &str) -> String {
    format!("Submission:{}|Root:{}", submission_id, commitment_root)
}

pub fn keccak256(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(bytes));
    out
}

pub fn attestation_digest(submission_id: &str, commitment_root: &str) -> [u8; 32] {
    keccak256(attestation_message(submission_id, commitment_root).as_bytes())
}

/// EIP-55 checksummed address of a public key.
pub fn address_of(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    checksum_address(&hash[12..])
}

fn checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> if i % 2 == 0 { 4 } else { 0 }) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn decode_hex(input: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let trimmed = input.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(stripped)
}

/// Recover the signer address from a prehashed message and a hex signature.
pub fn recover_address(digest: &[u8; 32], signature_hex: &str) -> Result<String, OracleError> {
    let bytes = decode_hex(signature_hex)
        .map_err(|e| OracleError::Signing(format!("signature is not hex: {e}")))?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(OracleError::Signing(format!(
            "signature must be {} bytes, got {}",
            SIGNATURE_LEN,
            bytes.len()
        )));
    }

    let v = match bytes[64] {
        27 | 28 => bytes[64] - 27,
        v => v,
    };
    let recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| OracleError::Signing(format!("invalid recovery id {}", bytes[64])))?;
    let signature = Signature::from_slice(&bytes[..64])
        .map_err(|e| OracleError::Signing(format!("malformed signature: {e}")))?;
    let key = VerifyingKey::recover_from_prehash(digest, &signature, recovery_id)
        .map_err(|e| OracleError::Signing(format!("public key recovery failed: {e}")))?;

    Ok(address_of(&key))
}

/// Check that an attestation was signed by its claimed oracle for this submission.
pub fn verify_attestation(attestation: &AttestationData, submission_id: &str) -> bool {
    let digest = attestation_digest(submission_id, &attestation.commitment_root);
    recover_address(&digest, &attestation.signature)
        .map(|recovered| recovered.eq_ignore_ascii_case(&attestation.oracle_address))
        .unwrap_or(false)
}

/// Holds the oracle identity key. The key never leaves this type.
pub struct AttestationSigner {
    key: SigningKey,
    address: String,
}

impl AttestationSigner {
    /// Parse a 32-byte hex private key, with or without a `0x` prefix.
    pub fn from_hex(private_key: &str) -> Result<Self, OracleError> {
        let bytes = decode_hex(private_key)
            .map_err(|e| OracleError::InvalidKey(format!("private key is not hex: {e}")))?;
        if bytes.len() != 32 {
            return Err(OracleError::InvalidKey(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| OracleError::InvalidKey("private key is not a valid scalar".into()))?;
        Ok(Self::from_signing_key(key))
    }

    pub fn from_signing_key(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn sign(&self, commitment_root: &str, submission_id: &str) -> Result<String, OracleError> {
        let digest = attestation_digest(submission_id, commitment_root);
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| OracleError::Signing(e.to_string()))?;

        let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
        bytes.extend_from_slice(&signature.to_bytes());
        bytes.push(recovery_id.to_byte());
        Ok(format!("0x{}", hex::encode(bytes)))
    }
}

impl fmt::Debug for AttestationSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttestationSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn derives_known_address() {
        let signer = AttestationSigner::from_hex(KEY_ONE).unwrap();
        assert_eq!(signer.address(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }

    #[test]
    fn accepts_unprefixed_key() {
        let signer = AttestationSigner::from_hex(&KEY_ONE[2..]).unwrap();
        assert_eq!(signer.address(), "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf");
    }

    #[test]
    fn rejects_bad_key_material() {
        assert!(matches!(
            AttestationSigner::from_hex("0xnothex"),
            Err(OracleError::InvalidKey(_))
        ));
        assert!(matches!(
            AttestationSigner::from_hex("0x01"),
            Err(OracleError::InvalidKey(_))
        ));
        let zero = format!("0x{}", "00".repeat(32));
        assert!(matches!(
            AttestationSigner::from_hex(&zero),
            Err(OracleError::InvalidKey(_))
        ));
    }

    #[test]
    fn message_layout() {
        assert_eq!(
            attestation_message("sub-1", "abcd"),
            "Submission:sub-1|Root:abcd"
        );
    }

    #[test]
    fn signature_recovers_signer() {
        let signer = AttestationSigner::from_hex(KEY_ONE).unwrap();
        let signature = signer.sign("deadbeef", "sub-42").unwrap();
        assert!(signature.starts_with("0x"));
        assert_eq!(signature.len(), 2 + SIGNATURE_LEN * 2);

        let digest = attestation_digest("sub-42", "deadbeef");
        assert_eq!(recover_address(&digest, &signature).unwrap(), signer.address());
    }

    #[test]
    fn legacy_recovery_byte_is_accepted() {
        let signer = AttestationSigner::from_hex(KEY_ONE).unwrap();
        let signature = signer.sign("root", "id").unwrap();
        let mut bytes = hex::decode(&signature[2..]).unwrap();
        bytes[64] += 27;
        let digest = attestation_digest("id", "root");
        assert_eq!(
            recover_address(&digest, &hex::encode(bytes)).unwrap(),
            signer.address()
        );
    }

    #[test]
    fn attestation_bound_to_submission() {
        let signer = AttestationSigner::from_hex(KEY_ONE).unwrap();
        let attestation = AttestationData {
            commitment_root: "cafe".into(),
            oracle_address: signer.address().to_string(),
            signature: signer.sign("cafe", "sub-1").unwrap(),
            timestamp: Utc::now(),
        };
        assert!(verify_attestation(&attestation, "sub-1"));
        assert!(!verify_attestation(&attestation, "sub-2"));

        let mut tampered = attestation.clone();
        tampered.commitment_root = "cafd".into();
        assert!(!verify_attestation(&tampered, "sub-1"));
    }

    #[test]
    fn debug_output_hides_key() {
        let signer = AttestationSigner::from_hex(KEY_ONE).unwrap();
        let rendered = format!("{:?}", signer);
        assert!(rendered.contains(signer.address()));
        assert!(!rendered.contains("key"));
    }
}
