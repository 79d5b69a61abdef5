//! # HTTP Boundary
//!
//! Decodes inbound observations, invokes the resolver, and encodes the
//! consolidated identity as JSON. Invalid input maps to 400, store and
//! invariant failures to 500; diagnostics never echo contact data.

use crate::error::ResolveError;
use crate::model::{ConsolidatedIdentity, Observation};
use crate::resolver::IdentityResolver;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Shared handle to the resolver behind the HTTP boundary.
///
/// Each request takes the write lock for the span of one resolve call; the
/// resolver itself holds no locks across its read-decide-write sequence.
#[derive(Clone)]
pub struct AppState {
    resolver: Arc<RwLock<IdentityResolver>>,
}

impl AppState {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self {
            resolver: Arc::new(RwLock::new(resolver)),
        }
    }
}

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/identify", post(identify))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyResponse {
    pub contact: ConsolidatedIdentity,
}

#[derive(Debug)]
struct ApiError(ResolveError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ResolveError::InvalidInput => StatusCode::BAD_REQUEST,
            ResolveError::Store(_) | ResolveError::InvariantViolation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn identify(
    State(state): State<AppState>,
    Json(request): Json<IdentifyRequest>,
) -> Result<Json<IdentifyResponse>, ApiError> {
    let observation = Observation::new(request.email, request.phone_number);
    debug!(
        has_email = observation.email.is_some(),
        has_phone = observation.phone_number.is_some(),
        "identify request"
    );

    let contact = state
        .resolver
        .write()
        .resolve(&observation)
        .map_err(ApiError)?;
    Ok(Json(IdentifyResponse { contact }))
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    contacts: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "idmesh",
        contacts: state.resolver.read().contact_count(),
    })
}
