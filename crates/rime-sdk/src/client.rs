//! RIME client implementation.

use reqwest::StatusCode;
use rime_core::{Action, AgentState, OrchestrationResult, Result, RimeError, ScreenContext};
use rime_state::EventKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stream::EventStream;

/// Client for interacting with a RIME node.
#[derive(Clone)]
pub struct RimeClient {
    /// Base URL of the RIME node.
    base_url: String,

    /// HTTP client.
    http_client: reqwest::Client,
}

/// Response envelope used by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

/// Request body for submitting an intent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PushContextRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    context: &'a ScreenContext,
}

/// Node health as reported by `/health`.
#[derive(Debug, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub agents: Vec<AgentState>,
}

impl RimeClient {
    /// Connect to a RIME node.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Self {
            base_url: url.trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        };

        // Verify connection with health check
        client.health().await?;

        Ok(client)
    }

    /// Fetch node health.
    pub async fn health(&self) -> Result<Health> {
        self.get("/health", "health", "node").await
    }

    /// Submit an intent and wait for the orchestration result.
    pub async fn submit_intent(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<OrchestrationResult> {
        let response = self
            .http_client
            .post(self.url("/api/intent"))
            .json(&SubmitRequest { query, session_id })
            .send()
            .await
            .map_err(connection_error)?;

        read_envelope(response, "intent", query).await
    }

    /// Status of every agent on the node.
    pub async fn agent_status(&self) -> Result<Vec<AgentState>> {
        self.get("/api/agents/status", "agents", "all").await
    }

    /// Current screen context, optionally for a session.
    pub async fn current_context(&self, session_id: Option<&str>) -> Result<ScreenContext> {
        let mut request = self.http_client.get(self.url("/api/context/current"));
        if let Some(session_id) = session_id {
            request = request.query(&[("sessionId", session_id)]);
        }
        let response = request.send().await.map_err(connection_error)?;
        read_envelope(response, "context", session_id.unwrap_or("current")).await
    }

    /// Push a collected context to the node.
    pub async fn push_context(
        &self,
        session_id: Option<&str>,
        context: &ScreenContext,
    ) -> Result<ScreenContext> {
        let response = self
            .http_client
            .post(self.url("/api/context"))
            .json(&PushContextRequest { session_id, context })
            .send()
            .await
            .map_err(connection_error)?;

        read_envelope(response, "context", session_id.unwrap_or("current")).await
    }

    /// Get an action by ID.
    pub async fn get_action(&self, id: Uuid) -> Result<Action> {
        self.get(&format!("/api/actions/{id}"), "action", &id.to_string())
            .await
    }

    /// List every action known to the node.
    pub async fn list_actions(&self) -> Result<Vec<Action>> {
        self.get("/api/actions", "actions", "all").await
    }

    /// Approve a pending action.
    pub async fn approve(&self, id: Uuid) -> Result<Action> {
        self.action_command(id, "approve").await
    }

    /// Reject a pending action.
    pub async fn reject(&self, id: Uuid) -> Result<Action> {
        self.action_command(id, "reject").await
    }

    /// Cancel an executing action.
    pub async fn cancel(&self, id: Uuid) -> Result<Action> {
        self.action_command(id, "cancel").await
    }

    /// Open the push channel, optionally limited to some event kinds.
    pub async fn events(&self, kinds: Option<&[EventKind]>) -> Result<EventStream> {
        EventStream::connect(&self.ws_url(kinds)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn ws_url(&self, kinds: Option<&[EventKind]>) -> String {
        let base = self
            .base_url
            .replace("http://", "ws://")
            .replace("https://", "wss://");
        match kinds {
            Some(kinds) => {
                let names: Vec<&str> = kinds.iter().map(|k| k.name()).collect();
                format!("{base}/ws?events={}", names.join(","))
            }
            None => format!("{base}/ws"),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, resource: &str, id: &str) -> Result<T> {
        let response = self
            .http_client
            .get(self.url(path))
            .send()
            .await
            .map_err(connection_error)?;

        read_envelope(response, resource, id).await
    }

    async fn action_command(&self, id: Uuid, command: &str) -> Result<Action> {
        let response = self
            .http_client
            .post(self.url(&format!("/api/actions/{id}/{command}")))
            .send()
            .await
            .map_err(connection_error)?;

        read_envelope(response, "action", &id.to_string()).await
    }
}

fn connection_error(err: reqwest::Error) -> RimeError {
    RimeError::ConnectionError(err.to_string())
}

async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
    resource: &str,
    id: &str,
) -> Result<T> {
    let status = response.status();
    let envelope: Envelope<T> = response
        .json()
        .await
        .map_err(|e| RimeError::SerializationError(e.to_string()))?;
    unwrap_envelope(status, envelope, resource, id)
}

fn unwrap_envelope<T>(
    status: StatusCode,
    envelope: Envelope<T>,
    resource: &str,
    id: &str,
) -> Result<T> {
    if status == StatusCode::NOT_FOUND {
        return Err(RimeError::NotFound {
            resource_type: resource.to_string(),
            id: id.to_string(),
        });
    }

    match envelope {
        Envelope { success: true, data: Some(data), .. } if status.is_success() => Ok(data),
        Envelope { error, .. } => {
            let message = error.unwrap_or_else(|| format!("request failed with status {status}"));
            if status == StatusCode::BAD_REQUEST {
                Err(RimeError::IntentInvalid { intent_id: None, message })
            } else {
                Err(RimeError::Internal(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(success: bool, data: Option<u32>, error: Option<&str>) -> Envelope<u32> {
        Envelope {
            success,
            data,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn test_unwrap_success() {
        let value = unwrap_envelope(StatusCode::OK, envelope(true, Some(7), None), "x", "1");
        assert_eq!(value.unwrap(), 7);
    }

    #[test]
    fn test_unwrap_not_found() {
        let err = unwrap_envelope(
            StatusCode::NOT_FOUND,
            envelope(false, None, Some("Action not found")),
            "action",
            "abc",
        )
        .unwrap_err();
        assert!(matches!(err, RimeError::NotFound { ref id, .. } if id == "abc"));
    }

    #[test]
    fn test_unwrap_failures() {
        let err = unwrap_envelope(
            StatusCode::BAD_REQUEST,
            envelope(false, None, Some("Query is required")),
            "intent",
            "",
        )
        .unwrap_err();
        assert!(matches!(err, RimeError::IntentInvalid { .. }));

        let err = unwrap_envelope(StatusCode::CONFLICT, envelope(false, None, None), "action", "1")
            .unwrap_err();
        assert!(err.to_string().contains("409"));
    }

    #[test]
    fn test_envelope_parsing() {
        let parsed: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"success":true,"data":[1,2],"timestamp":1700000000000}"#)
                .unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.data, Some(vec![1, 2]));
    }

    #[test]
    fn test_ws_url() {
        let client = RimeClient {
            base_url: "https://rime.local:4000".to_string(),
            http_client: reqwest::Client::new(),
        };
        assert_eq!(client.ws_url(None), "wss://rime.local:4000/ws");
        assert_eq!(
            client.ws_url(Some(&[EventKind::ActionUpdated, EventKind::ContextUpdate])),
            "wss://rime.local:4000/ws?events=action:updated,context:update"
        );
    }
}
