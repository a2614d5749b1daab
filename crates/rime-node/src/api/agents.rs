//! Agent status endpoint.

use axum::extract::State;
use rime_core::AgentState;

use super::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Status of every registered agent, in registration order.
pub async fn agent_status(State(state): State<AppState>) -> ApiResult<Vec<AgentState>> {
    Ok(ApiResponse::ok(state.orchestrator.agent_states().await))
}
