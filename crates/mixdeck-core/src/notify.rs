//! Publish/subscribe bridge from the engine to views
//!
//! Engine code publishes from whatever thread it runs on; each subscriber owns
//! a flume receiver and drains it from its own loop:
//!
//! ```text
//! engine thread → NotificationHub::publish → flume channel → view tick → drain()
//! ```

use crate::types::{ChainId, ParamRef};
use flume::{Receiver, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Engine-side change events
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    /// A parameter value changed (from any source, including learned controls)
    ValueChanged { param: ParamRef, value: f32 },
    /// The active chain pointer moved
    ActiveChainChanged(ChainId),
    /// Chains were added, removed or reordered
    ChainsChanged,
    /// A snapshot/scene was loaded; every visible value may be stale
    SnapshotLoaded,
}

/// Handle identifying one subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Receiving end of a subscription
pub struct Subscription {
    id: SubscriptionId,
    rx: Receiver<Notification>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Non-blocking receive
    pub fn try_recv(&self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }

    /// Drain all pending notifications
    pub fn drain(&self) -> impl Iterator<Item = Notification> + '_ {
        std::iter::from_fn(|| self.try_recv())
    }
}

/// Fan-out of engine notifications to any number of subscribers
#[derive(Default)]
pub struct NotificationHub {
    subscribers: Mutex<Vec<(SubscriptionId, Sender<Notification>)>>,
    next_id: AtomicU64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    // A publisher that panicked mid-send leaves the list intact, so a
    // poisoned lock is recovered rather than losing subscribers.
    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Sender<Notification>)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = flume::unbounded();
        self.lock().push((id, tx));
        log::debug!("Notify: subscription {:?} registered", id);
        Subscription { id, rx }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().retain(|(sub_id, _)| *sub_id != id);
        log::debug!("Notify: subscription {:?} removed", id);
    }

    /// Deliver to every live subscriber, pruning dropped receivers
    pub fn publish(&self, notification: Notification) {
        self.lock()
            .retain(|(_, tx)| tx.send(notification.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MixerChannel, ParamKind};

    fn level(ch: usize) -> ParamRef {
        ParamRef::new(MixerChannel(ch), ParamKind::Level)
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let hub = NotificationHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        hub.publish(Notification::ValueChanged { param: level(1), value: 0.5 });

        assert_eq!(a.drain().count(), 1);
        assert_eq!(b.drain().count(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let hub = NotificationHub::new();
        let sub = hub.subscribe();
        hub.unsubscribe(sub.id());
        hub.publish(Notification::ChainsChanged);
        assert!(sub.try_recv().is_none());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let hub = NotificationHub::new();
        let sub = hub.subscribe();
        drop(sub);
        hub.publish(Notification::SnapshotLoaded);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_poisoned_lock_still_registers() {
        let hub = std::sync::Arc::new(NotificationHub::new());
        let poisoner = {
            let hub = hub.clone();
            std::thread::spawn(move || {
                let _guard = hub.subscribers.lock().unwrap();
                panic!("publisher died holding the lock");
            })
        };
        assert!(poisoner.join().is_err());
        assert!(hub.subscribers.is_poisoned());

        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        hub.publish(Notification::ChainsChanged);
        assert_eq!(sub.drain().count(), 1);
        hub.unsubscribe(sub.id());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_from_other_thread() {
        let hub = std::sync::Arc::new(NotificationHub::new());
        let sub = hub.subscribe();
        let producer = {
            let hub = hub.clone();
            std::thread::spawn(move || {
                for i in 0..10 {
                    hub.publish(Notification::ValueChanged { param: level(i), value: 0.1 });
                }
            })
        };
        producer.join().unwrap();
        assert_eq!(sub.drain().count(), 10);
    }
}
