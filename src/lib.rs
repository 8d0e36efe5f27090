//! Gangway - self-healing WebSocket bridge
//!
//! Maintains a single logical WebSocket connection whose desired state
//! (should it be open or closed) and actual state (what is really happening
//! on the wire) can diverge, reconciling them autonomously. Outbound data
//! sent while disconnected is buffered and flushed on reconnect; observers
//! are notified of lifecycle transitions, errors, and inbound text without
//! the caller ever blocking.
//!
//! ## Components
//!
//! - **Bridge**: the connection reconciler — owns desired/actual state,
//!   both queues, and the socket handle; runs the periodic reconciliation
//!   cycle and exposes the public control surface
//! - **Queue**: ordered unbounded FIFO backing the control-task queue and
//!   the outbound buffer
//! - **Listeners**: multicast callback registry for the message, error,
//!   and state channels
//! - **Protocol**: the JSON chat envelope the surrounding glue layers over
//!   the bridge's opaque text frames

pub mod bridge;
pub mod config;
pub mod listeners;
pub mod protocol;
pub mod queue;
pub mod types;

pub use bridge::{ActualState, Bridge, BridgeConfig, ControlTask, DesiredState};
pub use config::Args;
pub use protocol::BridgeEnvelope;
pub use types::{BridgeError, Result};
