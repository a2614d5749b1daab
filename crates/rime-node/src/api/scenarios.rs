//! Built-in demo scenarios.

use axum::extract::State;
use rime_core::Scenario;
use serde::Serialize;

use super::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub query: &'static str,
    pub active: bool,
}

/// List the scenarios available in mock mode.
pub async fn list_scenarios(State(state): State<AppState>) -> ApiResult<Vec<ScenarioSummary>> {
    let active = state.scenario.as_ref().map(|s| s.scenario().id);
    let summaries = Scenario::all()
        .into_iter()
        .map(|s| ScenarioSummary {
            id: s.id,
            name: s.name,
            description: s.description,
            query: s.query,
            active: active == Some(s.id),
        })
        .collect();
    Ok(ApiResponse::ok(summaries))
}
