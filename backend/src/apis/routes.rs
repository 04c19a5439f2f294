use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use regulator::{
    merkle_tree::{fp_to_hex, Entry, MerkleProof},
    registry::SharedRegistry,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::response::{ApiError, ApiResponse};

#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
}

impl AppState {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub pid: u64,
    /// Decimal integer below the field modulus.
    pub pub_x: String,
    pub pub_y: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timestamp {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/register-user", post(register_user))
        .route("/root", get(root))
        .route("/proof/:index", get(proof))
        .fallback(not_found)
        .with_state(state)
}

async fn index() -> ApiResponse<Timestamp> {
    ApiResponse::ok(
        "Service running",
        Timestamp {
            timestamp: chrono::Utc::now().timestamp_millis(),
        },
    )
}

async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<ApiResponse<Vec<Value>>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    // Field checks happen before the registry lock is taken
    let entry = Entry::from_decimal(req.name, req.pid, &req.pub_x, &req.pub_y)?;

    let registry = state.registry.clone();
    let registration = run_blocking(move || registry.register_entry(entry)).await??;

    let message = if registration.newly_registered {
        "User registered"
    } else {
        "User already registered"
    };
    Ok(ApiResponse::ok(message, proof_to_data(&registration.proof)))
}

async fn root(State(state): State<AppState>) -> Result<ApiResponse<String>, ApiError> {
    let registry = state.registry.clone();
    let root = run_blocking(move || registry.root()).await?;

    Ok(ApiResponse::ok("Current root", fp_to_hex(&root)))
}

async fn proof(
    State(state): State<AppState>,
    index: Result<Path<usize>, PathRejection>,
) -> Result<ApiResponse<Vec<Value>>, ApiError> {
    let Path(index) = index.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let registry = state.registry.clone();
    let proof = run_blocking(move || registry.proof_for(index)).await??;

    Ok(ApiResponse::ok("Inclusion proof", proof_to_data(&proof)))
}

async fn not_found() -> ApiError {
    ApiError::bad_request("Route not found")
}

/// Lays a proof out as `[[sibling, path_index], ..., root]`, hex encoded.
pub fn proof_to_data(proof: &MerkleProof) -> Vec<Value> {
    let mut data: Vec<Value> = proof
        .path
        .iter()
        .map(|step| json!([fp_to_hex(&step.sibling), step.direction.path_index()]))
        .collect();
    data.push(Value::String(fp_to_hex(&proof.root)));
    data
}

/// Registry calls take a lock and may touch the disk, so they stay off the async workers.
async fn run_blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!(error = %e, "blocking registry task failed");
        ApiError::internal_server_error()
    })
}
