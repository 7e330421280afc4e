use keeper_models::PushEvent;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PushError {
    #[error("subscriber connection closed")]
    Closed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("no subscribers for user")]
    NoSubscribers,
}

/// Delivery end of one subscriber
pub trait PushSink: Send + Sync {
    fn push(&self, event: PushEvent) -> Result<(), PushError>;
}

impl PushSink for mpsc::UnboundedSender<PushEvent> {
    fn push(&self, event: PushEvent) -> Result<(), PushError> {
        self.send(event).map_err(|_| PushError::Closed)
    }
}

struct Subscriber {
    id: u64,
    client_id: u64,
    sink: Box<dyn PushSink>,
    evict: Option<oneshot::Sender<()>>,
}

/// Handle returned by `subscribe`; pass it to `hold` to wait for the end
#[derive(Debug)]
pub struct Subscription {
    pub id: u64,
    pub user_id: i64,
    pub client_id: u64,
    evicted: oneshot::Receiver<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionEnd {
    /// The connection went away and the subscriber removed itself
    Disconnected,
    /// A push failed and the registry dropped the subscriber
    Evicted,
}

/// Live subscribers keyed by user id
///
/// Every change to a user's list (append, prune, remove-empty) happens
/// under the write lock.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    users: Arc<RwLock<HashMap<i64, Vec<Subscriber>>>>,
    next_id: Arc<AtomicU64>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(
        &self,
        user_id: i64,
        client_id: u64,
        sink: Box<dyn PushSink>,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (evict_tx, evict_rx) = oneshot::channel();

        self.users
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(Subscriber {
                id,
                client_id,
                sink,
                evict: Some(evict_tx),
            });

        info!(
            user_id = user_id,
            client_id = client_id,
            subscription_id = id,
            "Subscriber registered"
        );

        Subscription {
            id,
            user_id,
            client_id,
            evicted: evict_rx,
        }
    }

    /// Waits until `disconnected` resolves or the subscriber is evicted.
    ///
    /// On disconnect the subscriber is removed here; an evicted one has
    /// already been removed by `notify`.
    pub async fn hold<F>(&self, subscription: Subscription, disconnected: F) -> SubscriptionEnd
    where
        F: Future<Output = ()>,
    {
        let Subscription {
            id,
            user_id,
            client_id,
            evicted,
        } = subscription;

        let end = tokio::select! {
            _ = disconnected => SubscriptionEnd::Disconnected,
            _ = evicted => SubscriptionEnd::Evicted,
        };

        if end == SubscriptionEnd::Disconnected {
            self.unsubscribe(user_id, id).await;
        }

        info!(
            user_id = user_id,
            client_id = client_id,
            subscription_id = id,
            end = ?end,
            "Subscription ended"
        );
        end
    }

    /// Removes one subscriber; a no-op when it is already gone
    pub async fn unsubscribe(&self, user_id: i64, subscription_id: u64) {
        let mut users = self.users.write().await;
        if let Some(subscribers) = users.get_mut(&user_id) {
            subscribers.retain(|s| s.id != subscription_id);
            if subscribers.is_empty() {
                users.remove(&user_id);
            }
        }
    }

    /// Evicts every subscriber of `user_id`, closing their connections.
    /// Returns how many were dropped.
    pub async fn disconnect_user(&self, user_id: i64) -> usize {
        let Some(subscribers) = self.users.write().await.remove(&user_id) else {
            return 0;
        };

        let count = subscribers.len();
        for mut subscriber in subscribers {
            if let Some(evict) = subscriber.evict.take() {
                let _ = evict.send(());
            }
        }
        info!(user_id = user_id, count = count, "Subscribers disconnected");
        count
    }

    /// Pushes a change to every subscriber of `user_id` except those of the
    /// originating client. Subscribers whose push fails are signalled and
    /// removed. Returns how many pushes were delivered.
    pub async fn notify(
        &self,
        user_id: i64,
        origin_client_id: u64,
        secret_id: i64,
        was_update: bool,
    ) -> Result<usize, NotifyError> {
        let event = PushEvent {
            secret_id,
            was_update,
        };

        let mut users = self.users.write().await;
        let subscribers = users
            .get_mut(&user_id)
            .ok_or(NotifyError::NoSubscribers)?;

        let mut delivered = 0;
        for subscriber in subscribers.iter_mut() {
            if subscriber.client_id == origin_client_id {
                continue;
            }

            match subscriber.sink.push(event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        user_id = user_id,
                        client_id = subscriber.client_id,
                        subscription_id = subscriber.id,
                        error = %e,
                        "Push failed, evicting subscriber"
                    );
                    if let Some(evict) = subscriber.evict.take() {
                        let _ = evict.send(());
                    }
                }
            }
        }

        // Evicted subscribers are the ones whose signal was consumed
        subscribers.retain(|s| s.evict.is_some());
        if subscribers.is_empty() {
            users.remove(&user_id);
        }

        debug!(
            user_id = user_id,
            secret_id = secret_id,
            delivered = delivered,
            "Notification fan-out finished"
        );
        Ok(delivered)
    }

    pub async fn subscriber_count(&self, user_id: i64) -> usize {
        self.users
            .read()
            .await
            .get(&user_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub async fn total_subscribers(&self) -> usize {
        self.users.read().await.values().map(Vec::len).sum()
    }
}
