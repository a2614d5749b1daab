//! WebSocket push channel.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use rime_core::Intent;
use rime_state::{ClientCommand, EventFilter, RimeEvent};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine;
use crate::state::AppState;

/// Command replies buffered per socket.
const REPLY_CAPACITY: usize = 32;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// Comma-separated event names to receive.
    pub events: Option<String>,
}

/// Event stream for dashboards and editor plugins.
pub async fn event_stream(
    ws: WebSocketUpgrade,
    Query(query): Query<StreamQuery>,
    State(state): State<AppState>,
) -> Response {
    let filter = query
        .events
        .as_deref()
        .map(EventFilter::parse)
        .unwrap_or_default();
    ws.on_upgrade(move |socket| handle_event_stream(socket, state, filter))
}

async fn handle_event_stream(mut socket: WebSocket, state: AppState, filter: EventFilter) {
    let mut subscription = state.events.subscribe(filter.clone());
    info!(subscription = %subscription.id, "client connected");

    let snapshot = RimeEvent::AgentsStatus(state.orchestrator.agent_states().await);
    if filter.matches(&snapshot) && send_event(&mut socket, &snapshot).await.is_err() {
        return;
    }

    let (reply_tx, mut replies) = mpsc::channel::<RimeEvent>(REPLY_CAPACITY);

    loop {
        tokio::select! {
            event = subscription.recv() => {
                match event {
                    Some(event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            Some(reply) = replies.recv() => {
                if send_event(&mut socket, &reply).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        spawn_command(state.clone(), text, reply_tx.clone());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = socket.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    info!(subscription = %subscription.id, "client disconnected");
}

async fn send_event(socket: &mut WebSocket, event: &RimeEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await,
        Err(e) => {
            warn!(event = %event.kind(), error = %e, "failed to encode event");
            Ok(())
        }
    }
}

/// Run a client command off the socket loop so pushed events keep flowing.
///
/// A failure reply goes back through `replies`; it is dropped if the socket has closed.
pub(crate) fn spawn_command(
    state: AppState,
    text: String,
    replies: mpsc::Sender<RimeEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Some(reply) = handle_command(&state, &text).await {
            let _ = replies.send(reply).await;
        }
    })
}

/// Apply a client command. Returns an `error` event to send back on failure.
///
/// Successful commands answer through the bus like their HTTP counterparts.
pub(crate) async fn handle_command(state: &AppState, text: &str) -> Option<RimeEvent> {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(e) => {
            debug!(error = %e, "unparseable client message");
            return Some(RimeEvent::error(format!("invalid message: {e}")));
        }
    };

    let outcome = match command {
        ClientCommand::SubmitIntent { query, session_id } => {
            let mut builder = Intent::builder().query(query).user("websocket");
            if let Some(session_id) = session_id {
                builder = builder.session(session_id);
            }
            match builder.build() {
                Ok(intent) => engine::process_intent(state, intent).await.map(|_| ()),
                Err(e) => Err(e),
            }
        }
        ClientCommand::Approve { action_id } => state.actions.approve(action_id).await.map(|_| ()),
        ClientCommand::Reject { action_id } => state.actions.reject(action_id).await.map(|_| ()),
    };

    outcome.err().map(|e| RimeEvent::error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use rime_core::ActionStatus;
    use rime_state::EventKind;

    fn mock_state() -> AppState {
        let mut config = AppConfig::default();
        config.features.mock = true;
        AppState::from_config(&config).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_then_approve_over_socket() {
        let state = mock_state();
        let mut sub = state.events.subscribe(EventFilter::kinds(vec![
            EventKind::WorkflowProposed,
            EventKind::ActionUpdated,
        ]));

        let reply = handle_command(
            &state,
            r#"{"event":"intent:submit","data":{"query":"fix this error","sessionId":"s1"}}"#,
        )
        .await;
        assert!(reply.is_none());

        let action_id = match sub.recv().await {
            Some(RimeEvent::WorkflowProposed(proposed)) => {
                assert_eq!(proposed.intent.session_id, "s1");
                proposed.result.actions[0].id
            }
            other => panic!("unexpected event: {other:?}"),
        };

        let approve = serde_json::json!({"event": "action:approve", "data": {"actionId": action_id}});
        assert!(handle_command(&state, &approve.to_string()).await.is_none());

        match sub.recv().await {
            Some(RimeEvent::ActionUpdated(action)) => assert_eq!(action.status, ActionStatus::Executing),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_command_does_not_block_events() {
        let state = mock_state();
        let mut sub = state.events.subscribe(EventFilter::kinds(vec![EventKind::ContextUpdate]));
        let (replies_tx, mut replies) = mpsc::channel(4);

        let pass = spawn_command(
            state.clone(),
            r#"{"event":"intent:submit","data":{"query":"fix this error"}}"#.to_string(),
            replies_tx.clone(),
        );
        state.contexts.update(None, rime_core::Scenario::research().context).await;
        assert!(matches!(sub.recv().await, Some(RimeEvent::ContextUpdate(_))));
        assert!(!pass.is_finished());

        pass.await.unwrap();
        spawn_command(state, "not json".to_string(), replies_tx).await.unwrap();
        assert!(matches!(replies.recv().await, Some(RimeEvent::Error { .. })));
    }

    #[tokio::test]
    async fn test_failures_answer_with_error_event() {
        let state = mock_state();

        let reply = handle_command(&state, "not json").await;
        assert!(matches!(reply, Some(RimeEvent::Error { .. })));

        let reject = serde_json::json!({
            "event": "action:reject",
            "data": {"actionId": uuid::Uuid::new_v4()},
        });
        match handle_command(&state, &reject.to_string()).await {
            Some(RimeEvent::Error { message }) => assert!(message.contains("not found")),
            other => panic!("unexpected reply: {other:?}"),
        }

        let blank = r#"{"event":"intent:submit","data":{"query":"   "}}"#;
        assert!(matches!(handle_command(&state, blank).await, Some(RimeEvent::Error { .. })));
    }
}
