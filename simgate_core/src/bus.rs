//! Message bus seam for SIMGATE
//!
//! The bridge publishes onto an external robotics message bus. That bus is
//! an opaque collaborator, so components only ever see the [`Publisher`] and
//! [`Subscriber`] traits. [`Hub`] is the in-process implementation: an MPMC
//! fan-out where every subscriber gets its own unbounded queue. It backs the
//! demo binary and every test.

use std::sync::Arc;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::{GateError, GateResult};

/// Anything that can publish messages of type `T` onto the bus.
pub trait Publisher<T> {
    fn send(&self, msg: T) -> GateResult<()>;
}

/// Anything that can consume messages of type `T` from the bus.
pub trait Subscriber<T> {
    /// Non-blocking receive; `None` when no message is pending.
    fn recv(&self) -> Option<T>;
}

/// In-process topic hub.
///
/// Cloning a `Hub` yields another handle onto the same topic; messages sent
/// through any handle reach every live subscriber. Subscribers that have
/// been dropped are pruned on the next send.
pub struct Hub<T> {
    topic: String,
    subscribers: Arc<Mutex<Vec<Sender<T>>>>,
}

impl<T> Clone for Hub<T> {
    fn clone(&self) -> Self {
        Self {
            topic: self.topic.clone(),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T: Clone + Send> Hub<T> {
    pub fn new(topic: &str) -> GateResult<Self> {
        if topic.is_empty() {
            return Err(GateError::communication("topic name must not be empty"));
        }
        Ok(Self {
            topic: topic.to_string(),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Register a new subscriber on this topic.
    pub fn subscribe(&self) -> HubSubscriber<T> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        HubSubscriber {
            topic: self.topic.clone(),
            rx,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Deliver `msg` to every live subscriber.
    ///
    /// A topic with no subscribers is not an error; the message is dropped,
    /// matching fire-and-forget publish semantics.
    pub fn send(&self, msg: T) -> GateResult<()> {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(msg.clone()).is_ok());
        Ok(())
    }
}

impl<T: Clone + Send> Publisher<T> for Hub<T> {
    fn send(&self, msg: T) -> GateResult<()> {
        Hub::send(self, msg)
    }
}

/// Receiving side of a [`Hub`] subscription.
pub struct HubSubscriber<T> {
    topic: String,
    rx: Receiver<T>,
}

impl<T> HubSubscriber<T> {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Non-blocking receive.
    pub fn recv(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Drain every pending message.
    pub fn drain(&self) -> Vec<T> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Number of messages waiting in this subscriber's queue.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl<T> Subscriber<T> for HubSubscriber<T> {
    fn recv(&self) -> Option<T> {
        HubSubscriber::recv(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_topic_rejected() {
        assert!(Hub::<u32>::new("").is_err());
    }

    #[test]
    fn test_fan_out() {
        let hub: Hub<u32> = Hub::new("numbers").unwrap();
        let a = hub.subscribe();
        let b = hub.subscribe();

        hub.send(7).unwrap();
        assert_eq!(a.recv(), Some(7));
        assert_eq!(b.recv(), Some(7));
        assert_eq!(a.recv(), None);
    }

    #[test]
    fn test_send_without_subscribers() {
        let hub: Hub<String> = Hub::new("void").unwrap();
        assert!(hub.send("nobody home".into()).is_ok());
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let hub: Hub<u32> = Hub::new("numbers").unwrap();
        let a = hub.subscribe();
        {
            let _b = hub.subscribe();
        }
        hub.send(1).unwrap();
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(a.drain(), vec![1]);
    }

    #[test]
    fn test_clone_shares_topic() {
        let hub: Hub<u32> = Hub::new("shared").unwrap();
        let sub = hub.subscribe();
        let other = hub.clone();
        other.send(3).unwrap();
        assert_eq!(sub.recv(), Some(3));
    }
}
