//! Socket task
//!
//! Owns exactly one connection attempt end to end: connect, pump frames,
//! close. Every event a task emits carries the generation it was spawned
//! with, so the reconciler can drop trailing events from a handle it has
//! already retired (a delayed close from an old socket must never corrupt
//! the state of a newer one).

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, warn};

use crate::types::BridgeError;

/// Instruction from the reconciler to a live socket task.
#[derive(Debug)]
pub(crate) enum SocketCommand {
    /// Write a text frame.
    Send(String),
    /// Request a graceful close and stop the task.
    Close,
}

/// Event emitted by a socket task, tagged with its generation.
#[derive(Debug)]
pub(crate) enum SocketEvent {
    Opened { generation: u64 },
    Closed { generation: u64 },
    Message { generation: u64, text: String },
    Error { generation: u64, error: BridgeError },
}

impl SocketEvent {
    pub fn generation(&self) -> u64 {
        match self {
            SocketEvent::Opened { generation }
            | SocketEvent::Closed { generation }
            | SocketEvent::Message { generation, .. }
            | SocketEvent::Error { generation, .. } => *generation,
        }
    }
}

/// Handle to a live socket task, held by the reconciler.
///
/// At most one handle exists at a time; replaced (never mutated) on each
/// open attempt. Dropping the handle closes the command channel, which the
/// task treats as a close request.
pub(crate) struct SocketHandle {
    pub generation: u64,
    cmd_tx: mpsc::UnboundedSender<SocketCommand>,
}

impl SocketHandle {
    /// Queue a text frame for writing. Never blocks.
    pub fn send(&self, payload: String) {
        let _ = self.cmd_tx.send(SocketCommand::Send(payload));
    }

    /// Request a graceful close.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(SocketCommand::Close);
    }
}

/// Spawn a socket task for one connection attempt.
pub(crate) fn spawn(
    generation: u64,
    url: String,
    event_tx: mpsc::UnboundedSender<SocketEvent>,
) -> SocketHandle {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    tokio::spawn(run(generation, url, cmd_rx, event_tx));
    SocketHandle { generation, cmd_tx }
}

async fn run(
    generation: u64,
    url: String,
    mut cmd_rx: mpsc::UnboundedReceiver<SocketCommand>,
    event_tx: mpsc::UnboundedSender<SocketEvent>,
) {
    debug!(%url, generation, "Connecting");

    let ws = match connect_async(url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            let _ = event_tx.send(SocketEvent::Error {
                generation,
                error: BridgeError::Handshake(e.to_string()),
            });
            let _ = event_tx.send(SocketEvent::Closed { generation });
            return;
        }
    };

    debug!(%url, generation, "Connected");
    let _ = event_tx.send(SocketEvent::Opened { generation });

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(SocketCommand::Send(payload)) => {
                    if let Err(e) = sink.send(Message::Text(payload)).await {
                        let _ = event_tx.send(SocketEvent::Error {
                            generation,
                            error: BridgeError::Transport(format!("Failed to send: {}", e)),
                        });
                        break;
                    }
                }
                // Explicit close, or the reconciler dropped the handle
                Some(SocketCommand::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let _ = event_tx.send(SocketEvent::Message { generation, text });
                }
                Some(Ok(Message::Binary(data))) => {
                    // Payloads are opaque text; binary frames that decode
                    // cleanly are accepted, malformed ones are dropped here
                    // and never reach a listener
                    match String::from_utf8(data) {
                        Ok(text) => {
                            let _ = event_tx.send(SocketEvent::Message { generation, text });
                        }
                        Err(e) => {
                            let error = BridgeError::Decode(e.to_string());
                            warn!(generation, %error, "Dropping undecodable frame");
                        }
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(generation, ?frame, "Peer closed connection");
                    break;
                }
                // Ping/pong are answered by tungstenite
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = event_tx.send(SocketEvent::Error {
                        generation,
                        error: BridgeError::Transport(e.to_string()),
                    });
                    break;
                }
                None => break,
            },
        }
    }

    let _ = event_tx.send(SocketEvent::Closed { generation });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_generation_accessor() {
        assert_eq!(SocketEvent::Opened { generation: 3 }.generation(), 3);
        assert_eq!(
            SocketEvent::Message {
                generation: 7,
                text: "hi".into()
            }
            .generation(),
            7
        );
    }

    #[tokio::test]
    async fn test_connect_failure_emits_error_then_closed() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        // Nothing listens on this port
        let handle = spawn(1, "ws://127.0.0.1:1".to_string(), event_tx);
        assert_eq!(handle.generation, 1);

        let first = event_rx.recv().await.expect("error event");
        assert!(matches!(first, SocketEvent::Error { generation: 1, .. }));
        let second = event_rx.recv().await.expect("closed event");
        assert!(matches!(second, SocketEvent::Closed { generation: 1 }));
    }
}
