//! Global keyboard listener table
//!
//! Stands in for the window-level key handler. Each carousel key owns at
//! most one slot, so remounting a view replaces its listener rather than
//! stacking a duplicate.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

use super::messages::NavKey;
use super::types::CarouselKey;
use crate::common::Subscription;

type KeyHandler = Arc<dyn Fn(NavKey) -> bool + Send + Sync>;

struct Slot {
    key: CarouselKey,
    id: u64,
    handler: KeyHandler,
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    slots: Vec<Slot>,
}

/// Cheap to clone; clones share the same listener table.
#[derive(Clone, Default)]
pub struct KeyboardHub {
    inner: Arc<Mutex<HubInner>>,
}

impl fmt::Debug for KeyboardHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("KeyboardHub")
            .field(
                "keys",
                &inner.slots.iter().map(|s| &s.key).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl KeyboardHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` for `key`, replacing any listener already
    /// registered under it. The handler returns whether it consumed the key.
    pub fn register<F>(&self, key: CarouselKey, handler: F) -> Subscription
    where
        F: Fn(NavKey) -> bool + Send + Sync + 'static,
    {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            let slot = Slot {
                key: key.clone(),
                id,
                handler: Arc::new(handler),
            };
            match inner.slots.iter().position(|s| s.key == key) {
                Some(index) => {
                    log::debug!(
                        "[KeyboardHub] Replacing listener for {:?}",
                        key
                    );
                    inner.slots[index] = slot;
                }
                None => inner.slots.push(slot),
            }
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                // A newer registration for the same key keeps its slot.
                inner.lock().slots.retain(|s| s.id != id);
            }
        })
    }

    /// Deliver a key press to every registered listener in registration
    /// order. Returns how many consumed it.
    pub fn dispatch(&self, key: NavKey) -> usize {
        let handlers: Vec<KeyHandler> = self
            .inner
            .lock()
            .slots
            .iter()
            .map(|s| Arc::clone(&s.handler))
            .collect();
        handlers.iter().filter(|handler| handler(key)).count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_registered(&self, key: &CarouselKey) -> bool {
        self.inner.lock().slots.iter().any(|s| &s.key == key)
    }
}
