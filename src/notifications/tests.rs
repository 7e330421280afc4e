//! Tests for notifications module
//!
//! These tests verify:
//! - the originating client is never notified
//! - failed pushes evict the subscriber and release its hold
//! - disconnects remove the subscriber
//! - a user's streams can be closed from the server side

#[cfg(test)]
mod tests {
    use super::super::*;
    use keeper_models::PushEvent;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Clone, Default)]
    struct RecordingSink {
        events: Arc<Mutex<Vec<PushEvent>>>,
    }

    impl PushSink for RecordingSink {
        fn push(&self, event: PushEvent) -> Result<(), PushError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct FailingSink;

    impl PushSink for FailingSink {
        fn push(&self, _event: PushEvent) -> Result<(), PushError> {
            Err(PushError::Closed)
        }
    }

    #[tokio::test]
    async fn test_notify_without_subscribers() {
        let registry = SubscriberRegistry::new();
        assert_eq!(
            registry.notify(1, 10, 5, false).await,
            Err(NotifyError::NoSubscribers)
        );
    }

    #[tokio::test]
    async fn test_notify_skips_originating_client() {
        let registry = SubscriberRegistry::new();
        let origin = RecordingSink::default();
        let other = RecordingSink::default();

        let _a = registry.subscribe(1, 10, Box::new(origin.clone())).await;
        let _b = registry.subscribe(1, 20, Box::new(other.clone())).await;

        let delivered = registry.notify(1, 10, 5, true).await.unwrap();

        assert_eq!(delivered, 1);
        assert!(origin.events.lock().unwrap().is_empty());
        assert_eq!(
            *other.events.lock().unwrap(),
            vec![PushEvent {
                secret_id: 5,
                was_update: true
            }]
        );
    }

    #[tokio::test]
    async fn test_notify_is_scoped_to_user() {
        let registry = SubscriberRegistry::new();
        let alice = RecordingSink::default();
        let bob = RecordingSink::default();

        let _a = registry.subscribe(1, 10, Box::new(alice.clone())).await;
        let _b = registry.subscribe(2, 20, Box::new(bob.clone())).await;

        registry.notify(1, 99, 5, false).await.unwrap();

        assert_eq!(alice.events.lock().unwrap().len(), 1);
        assert!(bob.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_push_evicts_and_releases_hold() {
        let registry = SubscriberRegistry::new();
        let healthy = RecordingSink::default();

        let _ok = registry.subscribe(1, 10, Box::new(healthy.clone())).await;
        let broken = registry.subscribe(1, 20, Box::new(FailingSink)).await;

        let holder = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .hold(broken, std::future::pending::<()>())
                    .await
            })
        };

        let delivered = registry.notify(1, 99, 7, false).await.unwrap();
        assert_eq!(delivered, 1);
        assert_eq!(registry.subscriber_count(1).await, 1);

        let end = tokio::time::timeout(Duration::from_secs(1), holder)
            .await
            .expect("hold returned")
            .unwrap();
        assert_eq!(end, SubscriptionEnd::Evicted);
    }

    #[tokio::test]
    async fn test_last_evicted_subscriber_removes_user_entry() {
        let registry = SubscriberRegistry::new();
        let _broken = registry.subscribe(1, 20, Box::new(FailingSink)).await;

        assert_eq!(registry.notify(1, 99, 7, false).await, Ok(0));
        assert_eq!(registry.total_subscribers().await, 0);
        assert_eq!(
            registry.notify(1, 99, 8, false).await,
            Err(NotifyError::NoSubscribers)
        );
    }

    #[tokio::test]
    async fn test_disconnect_user_evicts_only_that_user() {
        let registry = SubscriberRegistry::new();
        let first = registry.subscribe(1, 10, Box::new(RecordingSink::default())).await;
        let _second = registry.subscribe(1, 20, Box::new(RecordingSink::default())).await;
        let _bob = registry.subscribe(2, 30, Box::new(RecordingSink::default())).await;

        let holder = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .hold(first, std::future::pending::<()>())
                    .await
            })
        };

        assert_eq!(registry.disconnect_user(1).await, 2);
        assert_eq!(registry.subscriber_count(1).await, 0);
        assert_eq!(registry.subscriber_count(2).await, 1);
        assert_eq!(registry.disconnect_user(1).await, 0);

        let end = tokio::time::timeout(Duration::from_secs(1), holder)
            .await
            .expect("hold returned")
            .unwrap();
        assert_eq!(end, SubscriptionEnd::Evicted);
    }

    #[tokio::test]
    async fn test_disconnect_removes_subscriber() {
        let registry = SubscriberRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel::<PushEvent>();
        let subscription = registry.subscribe(1, 10, Box::new(tx)).await;
        assert_eq!(registry.subscriber_count(1).await, 1);

        let end = registry.hold(subscription, async {}).await;

        assert_eq!(end, SubscriptionEnd::Disconnected);
        assert_eq!(registry.subscriber_count(1).await, 0);
    }

    #[tokio::test]
    async fn test_closed_channel_sink_is_evicted() {
        let registry = SubscriberRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel::<PushEvent>();
        let _subscription = registry.subscribe(1, 10, Box::new(tx)).await;
        drop(rx);

        assert_eq!(registry.notify(1, 99, 3, true).await, Ok(0));
        assert_eq!(registry.subscriber_count(1).await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_subscribes_are_not_lost() {
        let registry = SubscriberRegistry::new();

        let mut handles = Vec::new();
        for client_id in 0..32u64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let (tx, rx) = mpsc::unbounded_channel::<PushEvent>();
                let subscription = registry.subscribe(1, client_id, Box::new(tx)).await;
                (subscription, rx)
            }));
        }

        let mut kept = Vec::new();
        for handle in handles {
            kept.push(handle.await.unwrap());
        }

        assert_eq!(registry.subscriber_count(1).await, 32);
        assert_eq!(registry.notify(1, 0, 1, false).await, Ok(31));
    }
}
