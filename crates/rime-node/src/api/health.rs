//! Health check endpoint.

use axum::extract::State;
use rime_core::AgentState;
use serde::Serialize;

use super::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub features: Features,
    pub agents: Vec<AgentState>,
}

#[derive(Serialize)]
pub struct Features {
    pub mock: bool,
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<HealthResponse> {
    Ok(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: Features {
            mock: state.is_mock(),
        },
        agents: state.orchestrator.agent_states().await,
    }))
}
