use e2e_tests::TestServer;
use keeper_models::{Credentials, PushEvent, Secret, SecretPayload, TextNote};
use keepercli::{ClientConfig, ClientError, ClientEvent, Storage, SyncClient};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const SHARED_SALT: u64 = 4242;

fn credential(title: &str) -> Secret {
    Secret::with_content(
        title,
        SecretPayload::Credential(Credentials {
            login: "u".to_string(),
            password: "p".to_string(),
        }),
    )
}

#[tokio::test]
async fn test_update_is_pushed_to_other_sessions_only() {
    let server = TestServer::start().await.unwrap();

    let first = server.client(1, SHARED_SALT).unwrap();
    first.register("alice", "alice-pw").await.unwrap();
    let storage = keepercli::RemoteStorage::new(first.clone()).await.unwrap();
    storage.create(&credential("mail")).await.unwrap();

    let stored = storage.get_all().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, 1);

    let (second, _) = server.session("alice", "alice-pw", 2, SHARED_SALT).await.unwrap();
    let (third, third_storage) = server.session("alice", "alice-pw", 3, SHARED_SALT).await.unwrap();

    let mut second_stream = second.subscribe().await.unwrap();
    let mut third_stream = third.subscribe().await.unwrap();
    server.wait_for_subscribers(2).await.unwrap();

    let mut secret = third_storage.get(1).await.unwrap();
    secret.title = "mail (work)".to_string();
    third_storage.update(&secret).await.unwrap();

    let pushed = timeout(Duration::from_secs(2), second_stream.next_event())
        .await
        .expect("push delivered")
        .expect("stream open")
        .unwrap();
    assert_eq!(
        pushed,
        PushEvent {
            secret_id: 1,
            was_update: true
        }
    );

    // Exactly one push, and none to the originating session
    assert!(timeout(Duration::from_millis(300), second_stream.next_event())
        .await
        .is_err());
    assert!(timeout(Duration::from_millis(300), third_stream.next_event())
        .await
        .is_err());

    let reloaded = storage.get(1).await.unwrap();
    assert_eq!(reloaded.title, "mail (work)");
    assert_eq!(
        reloaded.content,
        Some(SecretPayload::Credential(Credentials {
            login: "u".to_string(),
            password: "p".to_string(),
        }))
    );
}

#[tokio::test]
async fn test_foreign_delete_is_not_found() {
    let server = TestServer::start().await.unwrap();

    let alice = server.client(1, 1).unwrap();
    alice.register("alice", "alice-pw").await.unwrap();
    let alice_storage = keepercli::RemoteStorage::new(alice.clone()).await.unwrap();
    alice_storage.create(&credential("mail")).await.unwrap();

    let bob = server.client(2, 2).unwrap();
    bob.register("bob", "bob-pw").await.unwrap();

    let err = bob.delete_secret(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 404, .. }));
    assert_eq!(err.to_string(), "secret not found (id=1)");

    let err = bob.load_secret(1).await.unwrap_err();
    assert_eq!(err.to_string(), "secret not found (id=1)");

    let intact = alice_storage.get(1).await.unwrap();
    assert_eq!(intact.title, "mail");
}

#[tokio::test]
async fn test_delete_then_list_is_empty() {
    let server = TestServer::start().await.unwrap();

    let alice = server.client(1, 1).unwrap();
    alice.register("alice", "alice-pw").await.unwrap();
    let storage = keepercli::RemoteStorage::new(alice.clone()).await.unwrap();

    assert!(storage.get_all().await.unwrap().is_empty());
    let err = alice.load_secrets().await.unwrap_err();
    assert!(err.is_no_secrets());
    assert_eq!(err.to_string(), "no secrets found");

    storage
        .create(&Secret::with_content(
            "note",
            SecretPayload::Text(TextNote {
                content: "remember the milk".to_string(),
            }),
        ))
        .await
        .unwrap();
    let listed = storage.get_all().await.unwrap();
    assert_eq!(listed.len(), 1);

    storage.delete(listed[0].id).await.unwrap();
    assert!(storage.get_all().await.unwrap().is_empty());

    let err = storage.delete(listed[0].id).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_auth_error_vocabulary() {
    let server = TestServer::start().await.unwrap();

    let client = server.client(1, 1).unwrap();
    client.register("alice", "alice-pw").await.unwrap();

    let duplicate = server.client(2, 2).unwrap();
    let err = duplicate.register("alice", "other").await.unwrap_err();
    assert!(matches!(err, ClientError::AlreadyExists));
    assert_eq!(err.to_string(), "user already exists");

    let err = duplicate.login("alice", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "failed to authenticate");

    let err = duplicate.login("nobody", "alice-pw").await.unwrap_err();
    assert!(matches!(err, ClientError::AuthenticationFailed));
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() {
    // Bind then release a port so nothing listens on it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client =
        SyncClient::new(ClientConfig::new(format!("http://{}", addr), Some(1), None)).unwrap();

    let err = client.login("alice", "alice-pw").await.unwrap_err();
    assert_eq!(err.to_string(), "server unavailable");
}

#[tokio::test]
async fn test_listen_raises_reload_events() {
    let server = TestServer::start().await.unwrap();

    let writer = server.client(1, SHARED_SALT).unwrap();
    writer.register("alice", "alice-pw").await.unwrap();
    let writer_storage = keepercli::RemoteStorage::new(writer.clone()).await.unwrap();

    let (listener, _) = server.session("alice", "alice-pw", 2, SHARED_SALT).await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let listen_task = {
        let listener = listener.clone();
        tokio::spawn(async move { listener.listen(tx).await })
    };
    server.wait_for_subscribers(1).await.unwrap();

    // A second listener on the same client is refused
    let (other_tx, _other_rx) = mpsc::unbounded_channel();
    assert!(matches!(
        listener.listen(other_tx).await,
        Err(ClientError::AlreadyListening)
    ));

    writer_storage.create(&credential("mail")).await.unwrap();

    let event = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("reload raised")
        .expect("channel open");
    assert_eq!(
        event,
        ClientEvent::Reload {
            secret_id: 1,
            was_update: false
        }
    );

    drop(rx);
    listen_task.abort();
}

#[tokio::test]
async fn test_listen_reconnects_after_server_drops_stream() {
    let server = TestServer::start().await.unwrap();

    let writer = server.client(1, SHARED_SALT).unwrap();
    writer.register("alice", "alice-pw").await.unwrap();
    // First account in a fresh database
    let alice = 1;
    let writer_storage = keepercli::RemoteStorage::new(writer.clone()).await.unwrap();

    let (listener, _) = server.session("alice", "alice-pw", 2, SHARED_SALT).await.unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let listen_task = {
        let listener = listener.clone();
        tokio::spawn(async move { listener.listen(tx).await })
    };
    server.wait_for_subscribers(1).await.unwrap();

    // Dropping the only subscription closes the socket from the server side
    let dropped = server.drop_subscriptions(alice).await;
    assert_eq!(dropped, 1);
    assert_eq!(server.registry.total_subscribers().await, 0);

    // Back after the reconnect delay
    server.wait_for_subscribers(1).await.unwrap();

    writer_storage.create(&credential("mail")).await.unwrap();
    let event = timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("reload raised after reconnect")
        .expect("channel open");
    assert_eq!(
        event,
        ClientEvent::Reload {
            secret_id: 1,
            was_update: false
        }
    );

    drop(rx);
    let result = timeout(Duration::from_secs(1), listen_task)
        .await
        .expect("listener stopped once the receiver was dropped")
        .unwrap();
    assert!(result.is_ok());
    server.wait_for_subscribers(0).await.unwrap();
}

#[tokio::test]
async fn test_sessions_with_different_salts_cannot_read_each_other() {
    let server = TestServer::start().await.unwrap();

    let first = server.client(1, 1).unwrap();
    first.register("alice", "alice-pw").await.unwrap();
    let first_storage = keepercli::RemoteStorage::new(first.clone()).await.unwrap();
    first_storage.create(&credential("mail")).await.unwrap();

    let (_, second_storage) = server.session("alice", "alice-pw", 2, 2).await.unwrap();

    let err = second_storage.get(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Read(_)));
}
