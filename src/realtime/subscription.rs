use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;

pub type SubscriptionId = u64;

struct Slots<T> {
    next_id: SubscriptionId,
    entries: Vec<(SubscriptionId, mpsc::UnboundedSender<T>)>,
}

/// Fan-out list for one event kind.
///
/// Every subscriber gets its own queue, so a slow consumer never blocks the
/// socket reader. Delivery follows registration order.
pub struct Registry<T> {
    slots: Arc<Mutex<Slots<T>>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }
}

impl<T: Clone> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slots = self.slots.lock();
        let id = slots.next_id;
        slots.next_id += 1;
        slots.entries.push((id, tx));
        Subscription {
            id,
            receiver: rx,
            slots: Arc::downgrade(&self.slots),
        }
    }

    /// Delivers `event` to every live subscriber and returns how many got it.
    pub fn publish(&self, event: &T) -> usize {
        let mut slots = self.slots.lock();
        slots
            .entries
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
        slots.entries.len()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by a subscribe call. Dropping it unsubscribes.
pub struct Subscription<T> {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<T>,
    slots: Weak<Mutex<Slots<T>>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next event, or `None` once the owning registry is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            slots.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_all_subscribers_in_order() {
        let registry = Registry::<u32>::new();
        let mut first = registry.subscribe();
        let mut second = registry.subscribe();

        assert_eq!(registry.publish(&1), 2);
        assert_eq!(registry.publish(&2), 2);

        assert_eq!(first.recv().await, Some(1));
        assert_eq!(first.recv().await, Some(2));
        assert_eq!(second.recv().await, Some(1));
        assert_eq!(second.recv().await, Some(2));
        assert!(first.id() < second.id());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let registry = Registry::<&'static str>::new();
        let keep = registry.subscribe();
        let gone = registry.subscribe();
        assert_eq!(registry.len(), 2);

        gone.unsubscribe();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.publish(&"hola"), 1);
        drop(keep);
        assert!(registry.is_empty());
        assert_eq!(registry.publish(&"nadie"), 0);
    }

    #[tokio::test]
    async fn test_recv_ends_when_registry_dropped() {
        let registry = Registry::<u8>::new();
        let mut sub = registry.subscribe();
        registry.publish(&9);
        drop(registry);
        assert_eq!(sub.try_recv(), Some(9));
        assert_eq!(sub.recv().await, None);
    }
}
