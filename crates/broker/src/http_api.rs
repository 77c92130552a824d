use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::lookup::types::{BatchRequest, BatchResponse, LookupRequest, LookupResponse, StatsResponse};
use crate::lookup::{LookupCoordinator, LookupError};

#[derive(Clone)]
pub struct AppState {
    pub coord: Arc<LookupCoordinator>,
}

pub fn router(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/healthz", get(healthz))
        .route("/lookup", post(lookup))
        .route("/lookup/batch", post(lookup_batch))
        .route("/stats", get(stats))
        .with_state(state)
}

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn lookup(
    State(st): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> Result<Json<LookupResponse>, (StatusCode, String)> {
    st.coord.handle(req).await.map(Json).map_err(into_http)
}

pub async fn lookup_batch(
    State(st): State<AppState>,
    Json(req): Json<BatchRequest>,
) -> Json<BatchResponse> {
    Json(st.coord.handle_batch(req).await)
}

pub async fn stats(State(st): State<AppState>) -> Json<StatsResponse> {
    Json(st.coord.stats())
}

pub fn status_of(err: &LookupError) -> StatusCode {
    match err {
        LookupError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        LookupError::Index(e) if e.is_bad_request() => StatusCode::BAD_REQUEST,
        LookupError::Index(_) | LookupError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn into_http(err: LookupError) -> (StatusCode, String) {
    let code = status_of(&err);
    if code.is_server_error() {
        tracing::error!(error = %err, "lookup failed");
    }
    (code, err.to_string())
}
