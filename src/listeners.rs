//! Multicast listener registry
//!
//! Three independent event channels: inbound message text, socket-level
//! errors, and actual-state transitions. Listeners are boxed closures owned
//! by the reconciler task and invoked synchronously; each registered
//! callback fires exactly once per event. Invocation order follows
//! registration order but is not contractual.

use crate::bridge::ActualState;
use crate::types::BridgeError;

/// Invoked with the decoded text of each inbound payload.
pub type MessageListener = Box<dyn Fn(&str) + Send + Sync>;

/// Invoked with each socket-level error.
pub type ErrorListener = Box<dyn Fn(&BridgeError) + Send + Sync>;

/// Invoked with (previous, current) on every genuine state transition.
pub type StateListener = Box<dyn Fn(ActualState, ActualState) + Send + Sync>;

/// A listener bound for one of the three channels.
pub enum Listener {
    Message(MessageListener),
    Error(ErrorListener),
    State(StateListener),
}

/// Callback registry for the three event channels.
#[derive(Default)]
pub struct ListenerRegistry {
    message: Vec<MessageListener>,
    error: Vec<ErrorListener>,
    state: Vec<StateListener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Listener) {
        match listener {
            Listener::Message(cb) => self.message.push(cb),
            Listener::Error(cb) => self.error.push(cb),
            Listener::State(cb) => self.state.push(cb),
        }
    }

    pub fn emit_message(&self, text: &str) {
        for cb in &self.message {
            cb(text);
        }
    }

    pub fn emit_error(&self, error: &BridgeError) {
        for cb in &self.error {
            cb(error);
        }
    }

    pub fn emit_state(&self, old: ActualState, current: ActualState) {
        for cb in &self.state {
            cb(old, current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_each_listener_fires_once_per_event() {
        let mut registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            registry.register(Listener::Message(Box::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })));
        }

        registry.emit_message("hello");
        assert_eq!(count.load(Ordering::SeqCst), 3);

        registry.emit_message("again");
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut registry = ListenerRegistry::new();
        let messages = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));

        let m = Arc::clone(&messages);
        registry.register(Listener::Message(Box::new(move |_| {
            m.fetch_add(1, Ordering::SeqCst);
        })));
        let e = Arc::clone(&errors);
        registry.register(Listener::Error(Box::new(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        })));

        registry.emit_error(&BridgeError::Transport("refused".into()));
        assert_eq!(messages.load(Ordering::SeqCst), 0);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_state_listener_receives_pair() {
        let mut registry = ListenerRegistry::new();
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        registry.register(Listener::State(Box::new(move |old, current| {
            s.lock().unwrap().push((old, current));
        })));

        registry.emit_state(ActualState::Closed, ActualState::Waiting);
        registry.emit_state(ActualState::Waiting, ActualState::Open);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (ActualState::Closed, ActualState::Waiting),
                (ActualState::Waiting, ActualState::Open),
            ]
        );
    }

    #[test]
    fn test_emit_with_no_listeners_is_harmless() {
        let registry = ListenerRegistry::new();
        registry.emit_message("nobody home");
        registry.emit_state(ActualState::Open, ActualState::Closed);
    }
}
