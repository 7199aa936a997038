use std::sync::{Arc, RwLock};

use tracing::debug;

use super::domain::NegotiationId;

/// Emitted once a closing transition has committed.
#[derive(Debug, Clone, PartialEq)]
pub struct DealClosedEvent {
    pub negotiation_id: NegotiationId,
}

/// Subscriber contract for closed deals. Delivery is synchronous and
/// fire-and-forget: the closing transaction has already committed by the time
/// a subscriber runs, so failures must be absorbed and logged, never bubbled
/// back into the lifecycle.
pub trait DealClosedSubscriber: Send + Sync {
    fn on_deal_closed(&self, event: &DealClosedEvent);
}

/// In-process fan-out for deal closure. Subscribers are delivered to in
/// registration order, outside the subscriber lock so a handler may register
/// further subscribers without deadlocking.
#[derive(Default)]
pub struct NegotiationEventBus {
    subscribers: RwLock<Vec<Arc<dyn DealClosedSubscriber>>>,
}

impl NegotiationEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn DealClosedSubscriber>) {
        self.subscribers
            .write()
            .expect("subscriber lock poisoned")
            .push(subscriber);
    }

    pub fn emit_deal_closed(&self, event: DealClosedEvent) {
        let subscribers = self
            .subscribers
            .read()
            .expect("subscriber lock poisoned")
            .clone();
        debug!(
            negotiation_id = %event.negotiation_id,
            subscribers = subscribers.len(),
            "delivering deal closed event"
        );
        for subscriber in subscribers {
            subscriber.on_deal_closed(&event);
        }
    }
}
