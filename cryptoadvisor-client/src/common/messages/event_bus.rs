//! # Event Bus
//!
//! Topic-keyed publish/subscribe with synchronous delivery.
//!
//! - Delivery happens on the publishing thread, in subscription order.
//! - No buffering, persistence or replay. A view that mounts after a publish
//!   must pull current state (e.g. `BalanceStore::value`) on mount.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{CrossDomainEvent, Topic};
use crate::common::listeners::{Listeners, Subscription};

/// Cheap to clone; clones share the same subscriber tables.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    topics: RwLock<HashMap<Topic, Listeners<CrossDomainEvent>>>,
    events_published: AtomicU64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.inner.topics.read().len())
            .field("events_published", &self.events_published())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to one topic. The callback runs for every later publish on
    /// that topic until the returned handle is dropped.
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> Subscription
    where
        F: Fn(&CrossDomainEvent) + Send + Sync + 'static,
    {
        let listeners = {
            let mut topics = self.inner.topics.write();
            topics.entry(topic).or_default().clone()
        };
        log::debug!("[EventBus] New subscription on {:?}", topic);
        listeners.add(callback)
    }

    /// Deliver `payload` to the current subscribers of `topic`. Returns the
    /// number of subscribers that received it.
    ///
    /// An event offered on a topic other than its own is dropped.
    pub fn publish(&self, topic: Topic, payload: CrossDomainEvent) -> usize {
        if payload.topic() != topic {
            log::warn!(
                "[EventBus] Refusing {:?} event on {:?}",
                payload.topic(),
                topic
            );
            return 0;
        }
        self.inner.events_published.fetch_add(1, Ordering::Relaxed);

        // Clone the table handle out so no bus lock is held while callbacks
        // run; callbacks are free to subscribe or publish in turn.
        let listeners = self.inner.topics.read().get(&topic).cloned();
        match listeners {
            Some(listeners) => listeners.notify(&payload),
            None => {
                log::trace!(
                    "[EventBus] No subscribers for {:?}, dropping event",
                    topic
                );
                0
            }
        }
    }

    /// Publish on the event's own topic.
    pub fn emit(&self, event: CrossDomainEvent) -> usize {
        self.publish(event.topic(), event)
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .topics
            .read()
            .get(&topic)
            .map_or(0, Listeners::len)
    }

    pub fn events_published(&self) -> u64 {
        self.inner.events_published.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptoadvisor_model::OwnerId;
    use parking_lot::Mutex;

    fn owner() -> OwnerId {
        OwnerId::new("7").unwrap()
    }

    #[test]
    fn routes_by_topic() {
        let bus = EventBus::new();
        let sessions = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let sessions = Arc::clone(&sessions);
            bus.subscribe(Topic::Session, move |event| {
                sessions.lock().push(event.clone())
            })
        };

        bus.emit(CrossDomainEvent::RefreshFailed {
            owner: owner(),
            message: "timeout".into(),
        });
        bus.emit(CrossDomainEvent::SessionStarted { owner: owner() });

        assert_eq!(
            *sessions.lock(),
            vec![CrossDomainEvent::SessionStarted { owner: owner() }]
        );
        assert_eq!(bus.events_published(), 2);
    }

    #[test]
    fn delivery_is_synchronous_and_ordered() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<_> = (0..3)
            .map(|i| {
                let order = Arc::clone(&order);
                bus.subscribe(Topic::Session, move |_| order.lock().push(i))
            })
            .collect();

        let delivered =
            bus.publish(Topic::Session, CrossDomainEvent::SessionEnded {
                owner: owner(),
            });

        // Already observed by the time publish returns
        assert_eq!(delivered, 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        drop(subs);
        assert_eq!(bus.subscriber_count(Topic::Session), 0);
    }

    #[test]
    fn event_on_foreign_topic_is_dropped() {
        let bus = EventBus::new();
        let sessions = Arc::new(Mutex::new(Vec::new()));
        let _sub = {
            let sessions = Arc::clone(&sessions);
            bus.subscribe(Topic::Session, move |event| {
                sessions.lock().push(event.clone())
            })
        };

        let delivered = bus.publish(
            Topic::Session,
            CrossDomainEvent::RefreshFailed {
                owner: owner(),
                message: "timeout".into(),
            },
        );

        assert_eq!(delivered, 0);
        assert!(sessions.lock().is_empty());
        assert_eq!(bus.events_published(), 0);
    }

    #[test]
    fn subscriber_may_publish_reentrantly() {
        let bus = EventBus::new();
        let errors = Arc::new(Mutex::new(0));
        let _relay = {
            let relay_bus = bus.clone();
            bus.subscribe(Topic::Session, move |event| {
                relay_bus.emit(CrossDomainEvent::RefreshFailed {
                    owner: event.owner().clone(),
                    message: "relayed".into(),
                });
            })
        };
        let _count = {
            let errors = Arc::clone(&errors);
            bus.subscribe(Topic::BackgroundErrors, move |_| {
                *errors.lock() += 1
            })
        };

        bus.emit(CrossDomainEvent::SessionStarted { owner: owner() });
        assert_eq!(*errors.lock(), 1);
    }
}
