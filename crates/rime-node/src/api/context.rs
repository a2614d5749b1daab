//! Screen-context endpoints.

use axum::extract::{Query, State};
use rime_core::ScreenContext;
use serde::Deserialize;

use super::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextQuery {
    pub session_id: Option<String>,
}

/// Request from the context collector.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushContextRequest {
    pub session_id: Option<String>,
    pub context: ScreenContext,
}

/// Current context, optionally for `?sessionId=`.
pub async fn current_context(
    State(state): State<AppState>,
    Query(query): Query<ContextQuery>,
) -> ApiResult<ScreenContext> {
    let context = state.current_context(query.session_id.as_deref()).await?;
    Ok(ApiResponse::ok(context))
}

/// Accept a context pushed by the collector and broadcast it.
pub async fn push_context(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PushContextRequest>,
) -> ApiResult<ScreenContext> {
    state
        .contexts
        .update(req.session_id.as_deref(), req.context.clone())
        .await;
    Ok(ApiResponse::ok(req.context))
}
