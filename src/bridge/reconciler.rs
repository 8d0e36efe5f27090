//! Reconciliation cycle
//!
//! Single-owner task: desired/actual state, both queues, the listener
//! registry, and the socket handle are mutated only here, driven by a
//! select over the cycle timer, the command channel, and socket events.
//! One control task is executed per tick; buffered sends flush completely
//! within a tick once the connection is open.

use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::socket::{self, SocketEvent, SocketHandle};
use super::{ActualState, BridgeConfig, Command, ControlTask, DesiredState, StateSnapshot};
use crate::listeners::ListenerRegistry;
use crate::queue::WorkQueue;

/// Run the reconciler until every `Bridge` handle is dropped.
pub(crate) async fn run(
    config: BridgeConfig,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    snapshot: Arc<RwLock<StateSnapshot>>,
) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut reconciler = Reconciler::new(&config, event_tx, snapshot);

    let mut cycle = interval(config.cycle_interval);
    cycle.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cycle.tick() => reconciler.tick().await,
            cmd = cmd_rx.recv() => match cmd {
                Some(cmd) => reconciler.handle_command(cmd).await,
                // Every handle dropped: tear down and stop
                None => {
                    reconciler.try_close().await;
                    break;
                }
            },
            // The reconciler keeps one sender alive, so recv() never yields None
            Some(event) = event_rx.recv() => reconciler.handle_socket_event(event).await,
        }
    }

    debug!("Reconciler stopped");
}

/// True when the observed state already satisfies the caller's intent.
fn satisfied(desired: DesiredState, actual: ActualState) -> bool {
    matches!(
        (desired, actual),
        (DesiredState::Open, ActualState::Open) | (DesiredState::Closed, ActualState::Closed)
    )
}

struct Reconciler {
    host: String,
    port: u16,
    desired: DesiredState,
    actual: ActualState,
    /// Control tasks, drained one per tick.
    tasks: WorkQueue<ControlTask>,
    /// Outbound payloads buffered while disconnected, drained fully per
    /// tick while open.
    unsent: WorkQueue<ControlTask>,
    listeners: ListenerRegistry,
    /// The live socket handle, if any. At most one at a time.
    socket: Option<SocketHandle>,
    /// Generation of the current socket handle. Events tagged with any
    /// other generation come from a retired handle and are dropped.
    generation: u64,
    event_tx: mpsc::UnboundedSender<SocketEvent>,
    snapshot: Arc<RwLock<StateSnapshot>>,
}

impl Reconciler {
    fn new(
        config: &BridgeConfig,
        event_tx: mpsc::UnboundedSender<SocketEvent>,
        snapshot: Arc<RwLock<StateSnapshot>>,
    ) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            desired: DesiredState::Closed,
            actual: ActualState::Closed,
            tasks: WorkQueue::new(),
            unsent: WorkQueue::new(),
            listeners: ListenerRegistry::new(),
            socket: None,
            generation: 0,
            event_tx,
            snapshot,
        }
    }

    fn resolve_url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    /// One cycle tick: execute at most one control task, then flush the
    /// outbound buffer if the connection is open.
    async fn tick(&mut self) {
        if let Some(task) = self.tasks.dequeue() {
            match task {
                ControlTask::Close => match self.actual {
                    // Already satisfied
                    ActualState::Closed => {}
                    _ => self.try_close().await,
                },
                ControlTask::Open => match self.actual {
                    ActualState::Closed | ActualState::Error => self.try_open().await,
                    // Already satisfied or in flight; redundant opens must
                    // never spawn a second socket
                    ActualState::Open | ActualState::Waiting => {}
                },
                // Send tasks never enter the control queue
                ControlTask::Send(_) => {}
            }
        }

        if self.actual == ActualState::Open {
            self.flush_unsent();
        }
    }

    /// Drain the entire outbound buffer in FIFO order.
    fn flush_unsent(&mut self) {
        while let Some(task) = self.unsent.dequeue() {
            // Empty-but-defined payloads are still written
            if let ControlTask::Send(payload) = task {
                if let Some(ref socket) = self.socket {
                    socket.send(payload);
                }
            }
        }
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::SetDesiredState(state) => self.set_desired_state(state).await,
            Command::SetHost {
                host,
                port,
                reconnect,
            } => self.set_host(host, port, reconnect),
            Command::Send(payload) => self.send(payload),
            Command::Register(listener) => self.listeners.register(listener),
        }
    }

    async fn set_desired_state(&mut self, state: DesiredState) {
        // Unchanged intent enqueues no duplicate task
        if state == self.desired {
            return;
        }
        self.desired = state;
        self.sync_snapshot().await;

        if !satisfied(self.desired, self.actual) {
            let task = match self.desired {
                DesiredState::Open => ControlTask::Open,
                DesiredState::Closed => ControlTask::Close,
            };
            debug!(desired = %self.desired, actual = %self.actual, "Enqueueing {:?}", task);
            self.tasks.enqueue([task]);
        }
    }

    fn set_host(&mut self, host: String, port: u16, reconnect: bool) {
        if host == self.host && port == self.port {
            return;
        }
        info!(%host, port, "Endpoint changed");
        self.host = host;
        self.port = port;

        // The old connection must be torn down before the new endpoint is
        // attempted; the pair is enqueued atomically so no other task can
        // land between them
        if reconnect && matches!(self.actual, ActualState::Open | ActualState::Waiting) {
            self.tasks
                .enqueue([ControlTask::Close, ControlTask::Open]);
        }
    }

    fn send(&mut self, payload: String) {
        match (self.actual, &self.socket) {
            (ActualState::Open, Some(socket)) => socket.send(payload),
            _ => self.unsent.enqueue([ControlTask::Send(payload)]),
        }
    }

    /// Open a fresh socket to the current endpoint.
    ///
    /// Bumps the generation so any trailing events from a previous handle
    /// are dropped, then moves actual state to `Waiting`. The connect
    /// itself is asynchronous; the cycle never waits on it.
    async fn try_open(&mut self) {
        self.generation += 1;
        let url = self.resolve_url();
        info!(%url, generation = self.generation, "Opening connection");
        self.socket = Some(socket::spawn(
            self.generation,
            url,
            self.event_tx.clone(),
        ));
        self.set_actual(ActualState::Waiting).await;
    }

    /// Request a graceful close and force actual state to `Closed`.
    ///
    /// Closing is authoritative: the handle is retired immediately and its
    /// generation invalidated, so the socket's own asynchronous close event
    /// arrives later and is dropped as stale.
    async fn try_close(&mut self) {
        if let Some(socket) = self.socket.take() {
            info!(generation = socket.generation, "Closing connection");
            socket.close();
            self.generation += 1;
        }
        self.set_actual(ActualState::Closed).await;
    }

    async fn handle_socket_event(&mut self, event: SocketEvent) {
        if event.generation() != self.generation {
            debug!(
                generation = event.generation(),
                current = self.generation,
                "Dropping event from retired socket"
            );
            return;
        }

        match event {
            SocketEvent::Opened { .. } => {
                self.set_actual(ActualState::Open).await;
                // A close was requested while the open was in flight
                if self.desired == DesiredState::Closed {
                    self.tasks.enqueue([ControlTask::Close]);
                }
            }
            SocketEvent::Closed { .. } => {
                self.socket = None;
                self.set_actual(ActualState::Closed).await;
                // Unexpected drop while the caller still wants the
                // connection: retry on the next tick
                if self.desired == DesiredState::Open {
                    self.tasks.enqueue([ControlTask::Open]);
                }
            }
            SocketEvent::Message { text, .. } => self.listeners.emit_message(&text),
            SocketEvent::Error { error, .. } => {
                warn!(%error, "Socket error");
                self.listeners.emit_error(&error);
            }
        }
    }

    /// Record a new actual state, notifying state listeners exactly once
    /// per genuine change. No-op sets do not notify.
    async fn set_actual(&mut self, state: ActualState) {
        let old = self.actual;
        self.actual = state;
        self.sync_snapshot().await;

        if old != state {
            info!(from = %old, to = %state, "Connection state changed");
            self.listeners.emit_state(old, state);
        }
    }

    async fn sync_snapshot(&self) {
        let mut snap = self.snapshot.write().await;
        snap.desired = self.desired;
        snap.actual = self.actual;
    }
}
