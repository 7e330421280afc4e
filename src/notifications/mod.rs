//! # Notifications Module
//!
//! Per-user fan-out of secret changes to the user's other connected
//! clients over a WebSocket.

pub mod handlers;
pub mod registry;
pub mod routes;

#[cfg(test)]
mod tests;

pub use registry::{
    NotifyError, PushError, PushSink, SubscriberRegistry, Subscription, SubscriptionEnd,
};
pub use routes::notifications_routes;
