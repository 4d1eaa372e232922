#![deny(unsafe_code)]

pub mod config;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use crate::config::{ClassifierMode, LedgerMode, OracleConfig};
use oracle_adapters::{
    FixedScoreClassifier, InMemoryRegistryLedger, MockCompanyRegistry, RandomizedVisionClassifier,
    RegistryEntry, StaticMapImagery,
};
use oracle_core::{
    AttestationSigner, ExistenceCheck, ImageClassifier, LedgerDispatch, OracleAggregator,
    OracleError, OracleResult, OwnershipCheck, SubmissionData,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Clone)]
pub struct ServiceState {
    pub aggregator: Arc<OracleAggregator>,
    /// Present when the in-memory registry backs the ledger boundary.
    pub registry: Option<Arc<InMemoryRegistryLedger>>,
}

impl ServiceState {
    /// Wire providers, signer and ledger from configuration.
    pub fn bootstrap(config: &OracleConfig) -> Result<Self, ServiceError> {
        if config.signer.uses_dev_key() {
            warn!("no oracle private key configured; using the development key");
        }
        let private_key = config.signer.resolve_private_key();
        let signer = Arc::new(AttestationSigner::from_hex(&private_key)?);

        let classifier: Arc<dyn ImageClassifier> = match config.providers.classifier {
            ClassifierMode::Randomized => Arc::new(RandomizedVisionClassifier),
            ClassifierMode::Fixed => {
                let score = config.providers.fixed_score;
                if !(0.0..=1.0).contains(&score) {
                    return Err(ServiceError::Config(format!(
                        "providers.fixed_score must be within [0, 1], got {score}"
                    )));
                }
                Arc::new(FixedScoreClassifier::new(score))
            }
        };
        let existence = Arc::new(ExistenceCheck::new(
            Arc::new(StaticMapImagery::default()),
            classifier,
        ));
        let ownership = Arc::new(OwnershipCheck::new(Arc::new(MockCompanyRegistry)));

        let mut aggregator = OracleAggregator::new(existence, ownership, signer)?
            .with_dispatch(config.ledger.dispatch);

        let registry = match config.ledger.mode {
            LedgerMode::Disabled => None,
            LedgerMode::Memory => {
                let registry = Arc::new(InMemoryRegistryLedger::new(
                    config.ledger.registry_address.clone(),
                ));
                aggregator = aggregator.with_ledger(registry.clone());
                Some(registry)
            }
        };

        Ok(Self {
            aggregator: Arc::new(aggregator),
            registry,
        })
    }
}

pub fn build_router(state: ServiceState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/verify", post(verify))
        .route("/v1/verify", post(verify))
        .route("/v1/registry/entries", get(list_registry_entries))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Boundary validation; the pipeline itself assumes well-formed input.
pub fn validate_submission(submission: &SubmissionData) -> Result<(), ApiError> {
    if submission.id.trim().is_empty() {
        return Err(ApiError::bad_request("submission id is required"));
    }
    let coordinates = submission.location.coordinates;
    if !coordinates.lat.is_finite() || !(-90.0..=90.0).contains(&coordinates.lat) {
        return Err(ApiError::bad_request(format!(
            "latitude {} out of range",
            coordinates.lat
        )));
    }
    if !coordinates.lng.is_finite() || !(-180.0..=180.0).contains(&coordinates.lng) {
        return Err(ApiError::bad_request(format!(
            "longitude {} out of range",
            coordinates.lng
        )));
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("oracle pipeline error: {0}")]
    Oracle(#[from] OracleError),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Http { status: StatusCode, message: String },
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::Http {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Http { status, message } => {
                (status, Json(serde_json::json!({ "error": message }))).into_response()
            }
            ApiError::Oracle(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": format!("verification failed: {err}") })),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    message: &'static str,
    oracle_address: String,
    ledger: Option<&'static str>,
    dispatch: LedgerDispatch,
}

async fn health(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "oracle-service",
        message: "Oracle Node Active",
        oracle_address: state.aggregator.oracle_address().to_string(),
        ledger: state.aggregator.ledger_id(),
        dispatch: state.aggregator.dispatch(),
    })
}

async fn verify(
    State(state): State<ServiceState>,
    payload: Result<Json<SubmissionData>, JsonRejection>,
) -> Result<Json<OracleResult>, ApiError> {
    let Json(submission) = payload
        .map_err(|rejection| ApiError::bad_request(format!("invalid request body: {rejection}")))?;
    validate_submission(&submission)?;

    Ok(Json(state.aggregator.verify_submission(&submission).await?))
}

#[derive(Debug, Clone, Serialize)]
struct RegistryEntriesResponse {
    registry_address: String,
    total: usize,
    chain_valid: bool,
    items: Vec<RegistryEntry>,
}

async fn list_registry_entries(
    State(state): State<ServiceState>,
) -> Result<Json<RegistryEntriesResponse>, ApiError> {
    let registry = state
        .registry
        .as_ref()
        .ok_or_else(|| ApiError::not_found("in-memory registry is not enabled"))?;

    let items = registry.records().await;
    Ok(Json(RegistryEntriesResponse {
        registry_address: registry.registry_address().to_string(),
        total: items.len(),
        chain_valid: registry.verify_chain().await,
        items,
    }))
}
