//! Intent API endpoint.

use axum::extract::State;
use rime_core::{Intent, IntentType, OrchestrationResult, ScreenContext};
use serde::Deserialize;

use super::{ApiJson, ApiResponse, ApiResult};
use crate::engine;
use crate::state::AppState;

/// Request to submit a new intent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIntentRequest {
    /// Free-text request. Required.
    pub query: Option<String>,

    #[serde(rename = "type", default)]
    pub intent_type: IntentType,

    pub user_id: Option<String>,

    pub session_id: Option<String>,

    /// Context captured alongside the request, if the caller has one.
    pub context: Option<ScreenContext>,
}

impl SubmitIntentRequest {
    fn into_intent(self) -> rime_core::Result<Intent> {
        let mut builder = Intent::builder().intent_type(self.intent_type);
        if let Some(query) = self.query {
            builder = builder.query(query);
        }
        if let Some(user_id) = self.user_id {
            builder = builder.user(user_id);
        }
        if let Some(session_id) = self.session_id {
            builder = builder.session(session_id);
        }
        if let Some(context) = self.context {
            builder = builder.context(context);
        }
        builder.build()
    }
}

/// Submit an intent and run one orchestration pass.
pub async fn submit_intent(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SubmitIntentRequest>,
) -> ApiResult<OrchestrationResult> {
    let intent = req.into_intent()?;
    let result = engine::process_intent(&state, intent).await?;
    Ok(ApiResponse::ok(result))
}
