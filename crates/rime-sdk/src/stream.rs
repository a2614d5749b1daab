//! Event stream for real-time updates.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{SinkExt, Stream, StreamExt};
use rime_core::{Result, RimeError};
use rime_state::{ClientCommand, RimeEvent};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use uuid::Uuid;

/// Push-channel connection: typed events in, commands out.
///
/// Also usable as a [`Stream`] of events.
pub struct EventStream {
    receiver: ReceiverStream<RimeEvent>,
    commands: mpsc::Sender<ClientCommand>,
    _reader: tokio::task::JoinHandle<()>,
    _writer: tokio::task::JoinHandle<()>,
}

impl EventStream {
    /// Connect to a node's `/ws` endpoint.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| RimeError::ConnectionError(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (event_tx, event_rx) = mpsc::channel(100);
        let (command_tx, mut command_rx) = mpsc::channel::<ClientCommand>(16);

        let reader = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        let Some(event) = parse_event(&text) else {
                            continue;
                        };
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    _ => {}
                }
            }
        });

        let writer = tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                let json = match serde_json::to_string(&command) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "failed to encode command");
                        continue;
                    }
                };
                if write.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            receiver: ReceiverStream::new(event_rx),
            commands: command_tx,
            _reader: reader,
            _writer: writer,
        })
    }

    /// Get the next event. `None` once the connection closes.
    pub async fn next(&mut self) -> Option<RimeEvent> {
        self.receiver.next().await
    }

    /// Submit an intent over the socket. The result arrives as `workflow:proposed`.
    pub async fn submit_intent(&self, query: &str, session_id: Option<&str>) -> Result<()> {
        self.send(ClientCommand::SubmitIntent {
            query: query.to_string(),
            session_id: session_id.map(str::to_string),
        })
        .await
    }

    /// Approve an action over the socket.
    pub async fn approve(&self, action_id: Uuid) -> Result<()> {
        self.send(ClientCommand::Approve { action_id }).await
    }

    /// Reject an action over the socket.
    pub async fn reject(&self, action_id: Uuid) -> Result<()> {
        self.send(ClientCommand::Reject { action_id }).await
    }

    async fn send(&self, command: ClientCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RimeError::ConnectionError("event stream closed".to_string()))
    }
}

impl Stream for EventStream {
    type Item = RimeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

fn parse_event(text: &str) -> Option<RimeEvent> {
    match serde_json::from_str(text) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!(error = %e, "skipping unrecognised frame");
            None
        }
    }
}
