//! Connector adapters for the PropToken oracle.

#![deny(unsafe_code)]

pub mod ledger;
pub mod providers;

pub use ledger::{AlwaysFailLedger, InMemoryRegistryLedger, RegistryEntry};
pub use providers::{
    FixedScoreClassifier, MockCompanyRegistry, RandomizedVisionClassifier, StaticMapImagery,
    UnavailableProvider,
};
