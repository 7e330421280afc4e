//! HTTP and WebSocket facade over the keeper server.
//!
//! Every authenticated call carries the bearer token and the per-process
//! client id. Unary calls have a fixed deadline and are never retried.

use futures_util::StreamExt;
use keeper_models::{
    AuthRequest, AuthResponse, ErrorResponse, PushEvent, SaveSecretResponse, Secret,
    CLIENT_ID_HEADER,
};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Deadline for every unary call
pub const UNARY_TIMEOUT: Duration = Duration::from_secs(5);
/// Pause between notification stream reconnects
pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Raised by `listen` for every change pushed by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    Reload { secret_id: i64, was_update: bool },
}

pub struct SyncClient {
    http: reqwest::Client,
    config: ClientConfig,
    token: RwLock<Option<String>>,
    password: RwLock<Option<Zeroizing<String>>>,
    listening: AtomicBool,
}

impl SyncClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(UNARY_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            http,
            config,
            token: RwLock::new(None),
            password: RwLock::new(None),
            listening: AtomicBool::new(false),
        })
    }

    pub fn client_id(&self) -> u64 {
        self.config.client_id
    }

    pub fn key_salt(&self) -> u64 {
        self.config.key_salt
    }

    /// Password of the last successful login or registration
    pub async fn password(&self) -> Option<Zeroizing<String>> {
        self.password.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn login(&self, login: &str, password: &str) -> Result<(), ClientError> {
        self.authenticate("/api/users/login", login, password).await
    }

    pub async fn register(&self, login: &str, password: &str) -> Result<(), ClientError> {
        self.authenticate("/api/users/register", login, password).await
    }

    async fn authenticate(&self, path: &str, login: &str, password: &str) -> Result<(), ClientError> {
        let body = AuthRequest {
            login: login.to_string(),
            password: password.to_string(),
        };

        let response: AuthResponse = self
            .send_json(self.http.post(self.url(path)).json(&body))
            .await?;

        *self.token.write().await = Some(response.access_token);
        *self.password.write().await = Some(Zeroizing::new(password.to_string()));

        info!(client_id = self.config.client_id, "Authenticated");
        Ok(())
    }

    pub async fn load_secrets(&self) -> Result<Vec<Secret>, ClientError> {
        let request = self.authed(self.http.get(self.url("/api/secrets"))).await?;
        self.send_json(request).await
    }

    pub async fn load_secret(&self, id: i64) -> Result<Secret, ClientError> {
        let request = self
            .authed(self.http.get(self.url(&format!("/api/secrets/{}", id))))
            .await?;
        self.send_json(request).await
    }

    /// Creates (id 0) or overwrites the secret; returns its id
    pub async fn save_secret(&self, secret: &Secret) -> Result<i64, ClientError> {
        let request = self
            .authed(self.http.post(self.url("/api/secrets")).json(secret))
            .await?;
        let response: SaveSecretResponse = self.send_json(request).await?;
        Ok(response.id)
    }

    pub async fn delete_secret(&self, id: i64) -> Result<(), ClientError> {
        let request = self
            .authed(self.http.delete(self.url(&format!("/api/secrets/{}", id))))
            .await?;
        self.send(request).await?;
        Ok(())
    }

    /// Opens the push stream for this client
    pub async fn subscribe(&self) -> Result<NotificationStream, ClientError> {
        let token = self.bearer().await?;
        let url = format!("{}/ws/notifications", ws_base(&self.config.server_url));

        let mut request = url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ClientError::Transport(e.to_string()))?,
        );
        headers.insert(
            HeaderName::from_static(CLIENT_ID_HEADER),
            HeaderValue::from(self.config.client_id),
        );

        let (inner, _) = tokio::time::timeout(UNARY_TIMEOUT, connect_async(request))
            .await
            .map_err(|_| ClientError::Timeout)??;

        debug!(client_id = self.config.client_id, "Notification stream opened");
        Ok(NotificationStream { inner })
    }

    /// Forwards pushes to `events` as `ClientEvent::Reload` until the
    /// receiver is dropped, reconnecting after any stream failure.
    ///
    /// Only one listener may run per client.
    pub async fn listen(&self, events: mpsc::UnboundedSender<ClientEvent>) -> Result<(), ClientError> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err(ClientError::AlreadyListening);
        }
        let _guard = ListenGuard(&self.listening);

        loop {
            match self.subscribe().await {
                Ok(mut stream) => {
                    info!(client_id = self.config.client_id, "Listening for secret changes");
                    loop {
                        let item = tokio::select! {
                            _ = events.closed() => return Ok(()),
                            item = stream.next_event() => item,
                        };
                        let Some(item) = item else {
                            warn!("Notification stream closed by server");
                            break;
                        };

                        match item {
                            Ok(event) => {
                                let reload = ClientEvent::Reload {
                                    secret_id: event.secret_id,
                                    was_update: event.was_update,
                                };
                                if events.send(reload).is_err() {
                                    return Ok(());
                                }
                            }
                            Err(ClientError::MalformedNotification(e)) => {
                                warn!(error = %e, "Skipping malformed notification");
                            }
                            Err(e) => {
                                warn!(error = %e, "Notification stream failed");
                                break;
                            }
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Failed to subscribe"),
            }

            tokio::select! {
                _ = events.closed() => return Ok(()),
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.server_url, path)
    }

    async fn bearer(&self) -> Result<String, ClientError> {
        self.token
            .read()
            .await
            .clone()
            .ok_or(ClientError::AuthenticationFailed)
    }

    async fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.bearer().await?;
        Ok(request
            .bearer_auth(token)
            .header(CLIENT_ID_HEADER, self.config.client_id.to_string()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        debug!(status = status.as_u16(), message = %message, "Server returned an error");
        Err(ClientError::from_status(status.as_u16(), message))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }
}

struct ListenGuard<'a>(&'a AtomicBool);

impl Drop for ListenGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// `http://` becomes `ws://`, `https://` becomes `wss://`
fn ws_base(server_url: &str) -> String {
    if let Some(rest) = server_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = server_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        server_url.to_string()
    }
}

/// Server push stream of one client
pub struct NotificationStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl NotificationStream {
    /// `None` once the server closes the stream
    pub async fn next_event(&mut self) -> Option<Result<PushEvent, ClientError>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(&text).map_err(ClientError::from));
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
