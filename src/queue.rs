//! Unbounded FIFO work queue
//!
//! Backs two independent queues inside the reconciler: the control-task
//! queue (drained one item per cycle tick) and the outbound message buffer
//! (drained completely while the connection is open). The two are never
//! merged because their draining policies differ.

use std::collections::VecDeque;

/// Ordered, unbounded FIFO container with multi-item enqueue.
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: VecDeque<T>,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Append one or more items in call order.
    ///
    /// Multi-item enqueue is atomic with respect to the queue: callers that
    /// push a pair (e.g. close-then-open on a host change) are guaranteed
    /// the pair is never interleaved with other enqueues.
    pub fn enqueue<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.items.extend(items);
    }

    /// Remove and return the oldest item, if any.
    pub fn dequeue(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut q = WorkQueue::new();
        q.enqueue([1, 2]);
        q.enqueue([3]);
        assert_eq!(q.dequeue(), Some(1));
        assert_eq!(q.dequeue(), Some(2));
        assert_eq!(q.dequeue(), Some(3));
        assert_eq!(q.dequeue(), None);
    }

    #[test]
    fn test_multi_enqueue_keeps_call_order() {
        let mut q = WorkQueue::new();
        q.enqueue(["close", "open"]);
        assert_eq!(q.len(), 2);
        assert_eq!(q.dequeue(), Some("close"));
        assert_eq!(q.dequeue(), Some("open"));
    }

    #[test]
    fn test_empty_queue() {
        let mut q: WorkQueue<String> = WorkQueue::new();
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
        assert_eq!(q.dequeue(), None);
        q.enqueue(["x".to_string()]);
        assert!(!q.is_empty());
    }
}
