//! Self-healing WebSocket bridge
//!
//! Maintains a single logical connection whose desired state (should it be
//! open) and actual state (what the wire is really doing) can diverge, and
//! reconciles them autonomously on a periodic cycle. Outbound payloads sent
//! while disconnected are buffered and flushed once the connection opens;
//! lifecycle changes, errors, and inbound text fan out to registered
//! listeners without ever blocking the caller.
//!
//! All bridge state lives inside one spawned reconciler task; the public
//! [`Bridge`] handle is a cheap clone that talks to it over a channel.

mod reconciler;
mod socket;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};

use crate::listeners::Listener;
use crate::types::BridgeError;

/// Caller intent for connectivity. Set only through
/// [`Bridge::set_desired_state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredState {
    Open,
    Closed,
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DesiredState::Open => write!(f, "open"),
            DesiredState::Closed => write!(f, "closed"),
        }
    }
}

/// Observed reality of the underlying socket.
///
/// Transitions are driven only by socket events and the cycle's own close
/// logic. `Error` is an extension point; the reconciler itself only moves
/// between `Closed`, `Waiting`, and `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActualState {
    Closed,
    Waiting,
    Open,
    Error,
}

impl fmt::Display for ActualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActualState::Closed => write!(f, "closed"),
            ActualState::Waiting => write!(f, "waiting"),
            ActualState::Open => write!(f, "open"),
            ActualState::Error => write!(f, "error"),
        }
    }
}

/// A queued intent awaiting execution by the reconciliation cycle.
///
/// The control queue carries only `Open` and `Close`; the outbound buffer
/// carries only `Send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlTask {
    Open,
    Close,
    Send(String),
}

/// Bridge endpoint and cadence configuration.
///
/// The transport scheme is fixed (`ws://`); host and port remain mutable at
/// runtime through [`Bridge::set_host`].
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    /// Reconciliation cycle cadence. One control task is processed per tick
    /// by design, which throttles how fast the bridge can flap.
    pub cycle_interval: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 10209,
            cycle_interval: Duration::from_millis(250),
        }
    }
}

/// Command from a [`Bridge`] handle to the reconciler task.
pub(crate) enum Command {
    SetDesiredState(DesiredState),
    SetHost {
        host: String,
        port: u16,
        reconnect: bool,
    },
    Send(String),
    Register(Listener),
}

/// Read-only state snapshot, written only by the reconciler task.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StateSnapshot {
    pub desired: DesiredState,
    pub actual: ActualState,
}

/// Handle to a running bridge.
///
/// Cloning is cheap; all clones talk to the same reconciler task. Control
/// methods never block: they enqueue a command and return. Dropping every
/// handle tears the connection down and stops the task.
#[derive(Clone)]
pub struct Bridge {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state: Arc<RwLock<StateSnapshot>>,
}

impl Bridge {
    /// Spawn a reconciler task and return a handle to it.
    ///
    /// The bridge starts with desired and actual state both `Closed`; call
    /// [`Bridge::set_desired_state`] to bring the connection up.
    pub fn new(config: BridgeConfig) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let state = Arc::new(RwLock::new(StateSnapshot {
            desired: DesiredState::Closed,
            actual: ActualState::Closed,
        }));

        tokio::spawn(reconciler::run(config, cmd_rx, Arc::clone(&state)));

        Self { cmd_tx, state }
    }

    /// Record the caller's intent for connectivity.
    ///
    /// Idempotent when the desired state is unchanged: repeated calls with
    /// the same value enqueue no duplicate control task.
    pub fn set_desired_state(&self, state: DesiredState) {
        let _ = self.cmd_tx.send(Command::SetDesiredState(state));
    }

    /// Change the endpoint. No-op when host and port are both unchanged.
    ///
    /// When `reconnect` is true and a connection is live or in flight, a
    /// close-then-open pair is enqueued atomically so the old connection is
    /// torn down before the new endpoint is attempted. Does not connect on
    /// its own when the bridge is already closed; opening only happens
    /// through the desired-state path.
    pub fn set_host(&self, host: impl Into<String>, port: u16, reconnect: bool) {
        let _ = self.cmd_tx.send(Command::SetHost {
            host: host.into(),
            port,
            reconnect,
        });
    }

    /// Send a text payload: written immediately while the socket is open,
    /// buffered for the next flush otherwise. Never blocks. Empty payloads
    /// are buffered and written like any other.
    pub fn send(&self, payload: impl Into<String>) {
        let _ = self.cmd_tx.send(Command::Send(payload.into()));
    }

    /// Register a listener for decoded inbound text.
    pub fn on_message(&self, cb: impl Fn(&str) + Send + Sync + 'static) {
        let _ = self
            .cmd_tx
            .send(Command::Register(Listener::Message(Box::new(cb))));
    }

    /// Register a listener for socket-level errors.
    pub fn on_error(&self, cb: impl Fn(&BridgeError) + Send + Sync + 'static) {
        let _ = self
            .cmd_tx
            .send(Command::Register(Listener::Error(Box::new(cb))));
    }

    /// Register a listener for (previous, current) state transitions.
    pub fn on_state(&self, cb: impl Fn(ActualState, ActualState) + Send + Sync + 'static) {
        let _ = self
            .cmd_tx
            .send(Command::Register(Listener::State(Box::new(cb))));
    }

    /// Current caller intent.
    pub async fn desired_state(&self) -> DesiredState {
        self.state.read().await.desired
    }

    /// Current observed connection state.
    pub async fn actual_state(&self) -> ActualState {
        self.state.read().await.actual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 10209);
        assert_eq!(config.cycle_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_state_display_matches_wire_names() {
        assert_eq!(ActualState::Waiting.to_string(), "waiting");
        assert_eq!(ActualState::Error.to_string(), "error");
        assert_eq!(DesiredState::Open.to_string(), "open");
        assert_eq!(DesiredState::Closed.to_string(), "closed");
    }

    #[test]
    fn test_bridge_starts_closed() {
        tokio_test::block_on(async {
            let bridge = Bridge::new(BridgeConfig::default());
            assert_eq!(bridge.desired_state().await, DesiredState::Closed);
            assert_eq!(bridge.actual_state().await, ActualState::Closed);
        });
    }
}
