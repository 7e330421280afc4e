//! WebSocket subscription handler

use axum::{
    extract::{
        ws::{Message, WebSocket},
        WebSocketUpgrade,
    },
    response::IntoResponse,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use keeper_models::PushEvent;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info};

use crate::auth::AuthedUser;
use crate::common::AppState;
use crate::notifications::SubscriberRegistry;

/// GET /ws/notifications
/// Upgrades an authenticated request to a push-only WebSocket. Each text
/// frame is one `PushEvent` as JSON.
pub async fn subscribe_handler(
    ws: WebSocketUpgrade,
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    user: AuthedUser,
) -> impl IntoResponse {
    let registry = state_lock.read().await.registry.clone();

    info!(
        user_id = user.user_id,
        client_id = user.client_id,
        "WebSocket subscription requested"
    );

    ws.on_upgrade(move |socket| handle_socket(socket, user, registry))
}

async fn handle_socket(socket: WebSocket, user: AuthedUser, registry: SubscriberRegistry) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<PushEvent>();

    let subscription = registry
        .subscribe(user.user_id, user.client_id, Box::new(tx))
        .await;

    // Drains pushes onto the socket; ends when the socket write fails
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to serialize push event");
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Clients never send anything meaningful; this only watches for close
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    let disconnected = async {
        tokio::select! {
            _ = &mut send_task => {}
            _ = &mut recv_task => {}
        }
    };

    let end = registry.hold(subscription, disconnected).await;

    send_task.abort();
    recv_task.abort();

    debug!(
        user_id = user.user_id,
        client_id = user.client_id,
        end = ?end,
        "WebSocket connection closed"
    );
}
