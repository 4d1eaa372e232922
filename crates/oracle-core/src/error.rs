use thiserror::Error;

/// Fatal oracle pipeline errors.
///
/// Only these abort a verification pass. Provider and ledger failures are
/// absorbed by the checks and the aggregator respectively.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("invalid oracle key material: {0}")]
    InvalidKey(String),

    #[error("attestation signing failed: {0}")]
    Signing(String),

    #[error("pipeline configuration error: {0}")]
    Configuration(String),
}

impl OracleError {
    pub fn slot_mismatch(expected: &str, actual: &str) -> Self {
        Self::Configuration(format!(
            "check wired into the wrong slot: expected '{}', got '{}'",
            expected, actual
        ))
    }
}

/// Signal provider adapter failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider '{provider}' unavailable: {message}")]
    Unavailable { provider: String, message: String },

    #[error("provider '{provider}' returned an invalid response: {message}")]
    InvalidResponse { provider: String, message: String },
}

impl ProviderError {
    pub fn unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Ledger boundary failures. Never fatal to a verification pass.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger '{ledger}' unavailable: {message}")]
    Unavailable { ledger: String, message: String },

    #[error("ledger rejected attestation: {0}")]
    Rejected(String),

    #[error("attestation cannot be encoded for the ledger: {0}")]
    InvalidAttestation(String),
}
