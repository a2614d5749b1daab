//! Action lifecycle endpoints.

use axum::extract::{Path, State};
use rime_core::{Action, RimeError};
use uuid::Uuid;

use super::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

/// List every known action, oldest first.
pub async fn list_actions(State(state): State<AppState>) -> ApiResult<Vec<Action>> {
    Ok(ApiResponse::ok(state.actions.list().await))
}

/// Get an action by ID.
pub async fn get_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Action> {
    let id = parse_action_id(&id)?;
    let action = state
        .actions
        .get(id)
        .await
        .ok_or(RimeError::ActionNotFound(id))?;
    Ok(ApiResponse::ok(action))
}

/// Approve a pending action; it completes after the settle delay.
pub async fn approve_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Action> {
    let id = parse_action_id(&id)?;
    Ok(ApiResponse::ok(state.actions.approve(id).await?))
}

/// Reject a pending action.
pub async fn reject_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Action> {
    let id = parse_action_id(&id)?;
    Ok(ApiResponse::ok(state.actions.reject(id).await?))
}

/// Cancel an executing action.
pub async fn cancel_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Action> {
    let id = parse_action_id(&id)?;
    Ok(ApiResponse::ok(state.actions.cancel(id).await?))
}

/// A path segment that is not a UUID names no action.
fn parse_action_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::from(RimeError::NotFound {
            resource_type: "action".to_string(),
            id: raw.to_string(),
        })
    })
}
