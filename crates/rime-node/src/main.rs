//! # RIME Node
//!
//! Orchestration server: HTTP API plus a WebSocket push channel.

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod api;
mod config;
mod engine;
mod logging;
mod state;

use config::AppConfig;
use state::AppState;

/// Run the RIME node server.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;
    let state = AppState::from_config(&config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        mock = config.features.mock,
        scenario = %config.features.mock_scenario,
        providers = state.orchestrator.providers().len(),
        "RIME node starting"
    );

    let app = create_router(state);

    info!(%addr, "listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router.
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health::health_check))
        // Context
        .route("/api/context", post(api::context::push_context))
        .route("/api/context/current", get(api::context::current_context))
        // Intents and agents
        .route("/api/intent", post(api::intent::submit_intent))
        .route("/api/agents/status", get(api::agents::agent_status))
        .route("/api/scenarios", get(api::scenarios::list_scenarios))
        // Action lifecycle
        .route("/api/actions", get(api::actions::list_actions))
        .route("/api/actions/:id", get(api::actions::get_action))
        .route("/api/actions/:id/approve", post(api::actions::approve_action))
        .route("/api/actions/:id/reject", post(api::actions::reject_action))
        .route("/api/actions/:id/cancel", post(api::actions::cancel_action))
        // Push channel
        .route("/ws", get(api::ws::event_stream))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging);
    run_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rime_core::Scenario;
    use serde_json::{json, Value};

    fn server(mock: bool) -> TestServer {
        let mut config = AppConfig::default();
        config.features.mock = mock;
        config.orchestrator.provider_timeout_ms = 0;
        config.lifecycle.settle_delay_ms = 50;
        TestServer::new(create_router(AppState::from_config(&config).unwrap())).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_agents() {
        let server = server(true);
        let response = server.get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["features"]["mock"], true);
        assert_eq!(body["data"]["agents"].as_array().unwrap().len(), 3);
        assert!(body["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn test_intent_without_query_is_bad_request() {
        let server = server(true);
        let response = server.post("/api/intent").json(&json!({"type": "command"})).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Query is required"));

        let actions: Value = server.get("/api/actions").await.json();
        assert!(actions["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_intent_then_approve_lifecycle() {
        let server = server(true);

        let body: Value = server
            .post("/api/intent")
            .json(&json!({"query": "fix this error"}))
            .await
            .json();
        assert_eq!(body["success"], true);
        let top = &body["data"]["actions"][0];
        assert_eq!(top["type"], "code_fix");
        assert_eq!(top["status"], "pending");
        assert!(body["data"]["metadata"]["agentsUsed"]
            .as_array()
            .unwrap()
            .contains(&json!("code")));

        let id = top["id"].as_str().unwrap().to_string();
        let approved: Value = server.post(&format!("/api/actions/{id}/approve")).await.json();
        assert_eq!(approved["data"]["status"], "executing");

        server
            .post(&format!("/api/actions/{id}/approve"))
            .await
            .assert_status(StatusCode::CONFLICT);

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let settled: Value = server.get(&format!("/api/actions/{id}")).await.json();
        assert_eq!(settled["data"]["status"], "completed");
        assert_eq!(settled["data"]["result"]["message"], "Action completed successfully");
    }

    #[tokio::test]
    async fn test_unknown_action_is_not_found() {
        let server = server(true);
        let id = uuid::Uuid::new_v4();

        for path in ["approve", "reject", "cancel"] {
            server
                .post(&format!("/api/actions/{id}/{path}"))
                .await
                .assert_status(StatusCode::NOT_FOUND);
        }
        server
            .get(&format!("/api/actions/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        for path in ["approve", "reject", "cancel"] {
            let response = server.post(&format!("/api/actions/not-a-real-id/{path}")).await;
            response.assert_status(StatusCode::NOT_FOUND);
            let body: Value = response.json();
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().contains("not-a-real-id"));
        }
        server
            .get("/api/actions/not-a-real-id")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_is_enveloped() {
        let server = server(true);

        for path in ["/api/intent", "/api/context"] {
            let response = server
                .post(path)
                .text("{\"query\": ")
                .content_type("application/json")
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert_eq!(body["success"], false);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_reject_then_cancel_conflicts() {
        let server = server(true);
        let body: Value = server
            .post("/api/intent")
            .json(&json!({"query": "fix this error"}))
            .await
            .json();
        let id = body["data"]["actions"][1]["id"].as_str().unwrap().to_string();

        let rejected: Value = server.post(&format!("/api/actions/{id}/reject")).await.json();
        assert_eq!(rejected["data"]["status"], "rejected");

        server
            .post(&format!("/api/actions/{id}/cancel"))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unmatched_query_falls_back() {
        let server = server(false);
        let body: Value = server
            .post("/api/intent")
            .json(&json!({"query": "good morning"}))
            .await
            .json();

        assert_eq!(body["data"]["actions"].as_array().unwrap().len(), 0);
        let confidence = body["data"]["confidence"].as_f64().unwrap();
        assert!((confidence - 0.3).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_pushed_context_is_used_per_session() {
        let server = server(false);

        let idle: Value = server.get("/api/context/current").await.json();
        assert_eq!(idle["data"]["analysis"]["application"], "unknown");

        server
            .post("/api/context")
            .json(&json!({"sessionId": "s1", "context": Scenario::coding().context}))
            .await
            .assert_status_ok();

        let current: Value = server
            .get("/api/context/current")
            .add_query_param("sessionId", "s1")
            .await
            .json();
        assert_eq!(current["data"]["analysis"]["application"], "editor");

        let body: Value = server
            .post("/api/intent")
            .json(&json!({"query": "fix this error", "sessionId": "s1"}))
            .await
            .json();
        assert_eq!(body["data"]["actions"][0]["type"], "code_fix");
    }

    #[tokio::test]
    async fn test_agents_and_scenarios() {
        let server = server(true);

        let agents: Value = server.get("/api/agents/status").await.json();
        let ids: Vec<_> = agents["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["research", "code", "communication"]);
        assert!(agents["data"]
            .as_array()
            .unwrap()
            .iter()
            .all(|a| a["status"] == "idle"));

        let scenarios: Value = server.get("/api/scenarios").await.json();
        let list = scenarios["data"].as_array().unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list[0]["id"], "coding");
        assert_eq!(list[0]["active"], true);
    }
}
