//! Configuration for oracled

use clap::ValueEnum;
use oracle_core::LedgerDispatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use zeroize::Zeroizing;

/// Well-known development key. Never use outside local runs.
pub const DEV_PRIVATE_KEY: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000001";

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OracleConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub signer: SignerConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub providers: ProviderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// Oracle identity key. Empty means the development key.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct SignerConfig {
    #[serde(default)]
    pub private_key: String,
}

impl SignerConfig {
    pub fn uses_dev_key(&self) -> bool {
        self.private_key.trim().is_empty()
    }

    pub fn resolve_private_key(&self) -> Zeroizing<String> {
        if self.uses_dev_key() {
            Zeroizing::new(DEV_PRIVATE_KEY.to_string())
        } else {
            Zeroizing::new(self.private_key.trim().to_string())
        }
    }
}

impl fmt::Debug for SignerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerConfig")
            .field("private_key", &if self.uses_dev_key() { "<dev>" } else { "<redacted>" })
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    /// No ledger; attestations are signed but not recorded.
    #[default]
    Disabled,
    /// In-process asset registry.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub mode: LedgerMode,

    #[serde(default)]
    pub dispatch: LedgerDispatch,

    #[serde(default = "default_registry_address")]
    pub registry_address: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            mode: LedgerMode::Disabled,
            dispatch: LedgerDispatch::Blocking,
            registry_address: default_registry_address(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    #[default]
    Randomized,
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub classifier: ClassifierMode,

    /// Score returned by the fixed classifier.
    #[serde(default = "default_fixed_score")]
    pub fixed_score: f64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierMode::Randomized,
            fixed_score: default_fixed_score(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_registry_address() -> String {
    "0x0000000000000000000000000000000000000000".to_string()
}

fn default_fixed_score() -> f64 {
    0.95
}

fn default_log_level() -> String {
    "info".to_string()
}

impl OracleConfig {
    /// Layer defaults, an optional file and `ORACLE_`-prefixed environment variables.
    ///
    /// Nested keys use `__`, e.g. `ORACLE_LEDGER__MODE=memory`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&OracleConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ORACLE")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}
