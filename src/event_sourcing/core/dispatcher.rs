use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::event::DomainEvent;

// ============================================================================
// Event Dispatcher - Post-save notification
// ============================================================================
//
// Every successfully saved event is handed to the dispatcher exactly once,
// after the write commits. A failing dispatch does not undo the write.
//
// ============================================================================

#[async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn dispatch(&self, event: Arc<dyn DomainEvent>) -> anyhow::Result<()>;
}

/// Fans saved events out to in-process subscribers.
pub struct BroadcastDispatcher {
    sender: broadcast::Sender<Arc<dyn DomainEvent>>,
}

impl BroadcastDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<dyn DomainEvent>> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventDispatcher for BroadcastDispatcher {
    async fn dispatch(&self, event: Arc<dyn DomainEvent>) -> anyhow::Result<()> {
        let event_id = event.id();
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::trace!(event_id = %event_id, receivers, "Event broadcast");
            }
            Err(_) => {
                tracing::trace!(event_id = %event_id, "No subscribers for event");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    #[derive(Debug)]
    struct Rang {
        id: Uuid,
    }

    impl DomainEvent for Rang {
        fn id(&self) -> Uuid {
            self.id
        }

        fn timeline_id(&self) -> Option<Uuid> {
            None
        }

        fn timestamp(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_dispatched_events() {
        let dispatcher = BroadcastDispatcher::new(8);
        let mut receiver = dispatcher.subscribe();
        let id = Uuid::new_v4();

        dispatcher.dispatch(Arc::new(Rang { id })).await.unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.id(), id);
        assert!(received.is::<Rang>());
    }

    #[tokio::test]
    async fn test_dispatch_without_subscribers_succeeds() {
        let dispatcher = BroadcastDispatcher::new(8);
        let result = dispatcher.dispatch(Arc::new(Rang { id: Uuid::new_v4() })).await;
        assert!(result.is_ok());
    }
}
