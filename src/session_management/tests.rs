use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use crate::configuration::RetryPolicy;
use crate::credential_store::{CredentialStore, Credentials, MemoryCredentialStore};
use crate::error_handling::types::{ClientError, SessionError};
use crate::messaging_client::testing::MockClientFactory;
use crate::messaging_client::{BrowserIdentity, ClientEvent, DisconnectReason};
use crate::session_management::{ManagerSettings, SessionManager, SessionStatus};

struct Harness {
    manager: Arc<SessionManager>,
    factory: Arc<MockClientFactory>,
    store: Arc<MemoryCredentialStore>,
}

fn harness_with(retry: RetryPolicy) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let factory = Arc::new(MockClientFactory::default());
    let store = Arc::new(MemoryCredentialStore::new());
    let settings = ManagerSettings {
        create_wait: Duration::from_secs(2),
        display_name: String::from("Test Gateway"),
        browser: BrowserIdentity {
            name: String::from("Test Gateway"),
            browser: String::from("Chrome"),
            version: String::from("1.0.0"),
        },
        retry,
    };
    let manager = Arc::new(SessionManager::new(
        factory.clone(),
        store.clone(),
        settings,
    ));
    Harness {
        manager,
        factory,
        store,
    }
}

fn harness() -> Harness {
    harness_with(RetryPolicy::default())
}

// Lets spawned tasks drain their queues; time is paused so this is instant.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn create_without_events_reports_initializing() {
    let h = harness();

    let outcome = h.manager.create("s1").await.unwrap();

    assert_eq!(outcome.session_id, "s1");
    assert_eq!(outcome.status, SessionStatus::Initializing);
    assert_eq!(outcome.qr, None);
    let status = h.manager.status("s1").await.unwrap();
    assert_eq!(status.status, SessionStatus::Initializing);
    assert!(!status.connected);
}

#[tokio::test(start_paused = true)]
async fn create_returns_qr_issued_during_wait() {
    let h = harness();
    let manager = h.manager.clone();
    let create = tokio::spawn(async move { manager.create("s1").await });

    settle().await;
    let (_, events) = h.factory.latest();
    events.send(ClientEvent::QrIssued("2@payload".into())).unwrap();

    let outcome = create.await.unwrap().unwrap();
    assert_eq!(outcome.status, SessionStatus::QrReady);
    assert!(outcome
        .qr
        .as_deref()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));

    let status = h.manager.status("s1").await.unwrap();
    assert!(status.has_qr);
    assert!(!status.has_pairing_code);
    let qr = h.manager.qr("s1").await.unwrap();
    assert!(qr.qr.is_some());
}

#[tokio::test(start_paused = true)]
async fn second_create_replaces_first_client() {
    let h = harness();
    h.manager.create("s1").await.unwrap();
    h.manager.create("s1").await.unwrap();

    assert_eq!(h.factory.connect_count(), 2);
    assert_eq!(h.manager.get_active_session_count().await, 1);

    let (first, first_events) = h.factory.connection(0);
    assert!(first.is_closed());

    // the replaced client's events no longer reach the registry
    let _ = first_events.send(ClientEvent::ConnectionOpened);
    settle().await;
    assert_eq!(
        h.manager.status("s1").await.unwrap().status,
        SessionStatus::Initializing
    );
}

#[tokio::test(start_paused = true)]
async fn status_follows_connection_open() {
    let h = harness();
    h.manager.create("s1").await.unwrap();
    let (_, events) = h.factory.latest();

    events.send(ClientEvent::QrIssued("2@a".into())).unwrap();
    events.send(ClientEvent::ConnectionOpened).unwrap();
    settle().await;

    let status = h.manager.status("s1").await.unwrap();
    assert_eq!(status.status, SessionStatus::Connected);
    assert!(status.connected);
    assert!(!status.has_qr);
    assert_eq!(h.manager.qr("s1").await.unwrap().qr, None);
}

#[tokio::test(start_paused = true)]
async fn short_phone_number_touches_nothing() {
    let h = harness();

    let err = h.manager.pair("s1", Some("123")).await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidPhoneNumber(_)));
    assert!(err.is_client_input());
    assert_eq!(h.factory.connect_count(), 0);
    assert!(h.manager.status("s1").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn missing_phone_number_is_rejected() {
    let h = harness();
    assert_err!(h.manager.pair("s1", None).await);
    assert_eq!(h.factory.connect_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn pair_creates_session_and_formats_code() {
    let h = harness();

    let outcome = h
        .manager
        .pair("s1", Some("+1 (234) 567-8901"))
        .await
        .unwrap();

    assert_eq!(outcome.phone_number, "12345678901");
    assert_eq!(outcome.raw_code, "ABCD1234");
    assert_eq!(outcome.pairing_code, "ABCD-1234");
    assert_eq!(outcome.instructions.len(), 5);
    assert_eq!(h.factory.connect_count(), 1);

    let (client, _) = h.factory.latest();
    assert_eq!(
        client.last_phone.lock().unwrap().as_deref(),
        Some("12345678901")
    );

    let status = h.manager.status("s1").await.unwrap();
    assert_eq!(status.status, SessionStatus::PairingCodeReady);
    assert!(status.has_pairing_code);
    assert!(!status.has_qr);
}

#[tokio::test(start_paused = true)]
async fn pair_reuses_existing_session() {
    let h = harness();
    h.manager.create("s1").await.unwrap();
    let (_, events) = h.factory.latest();
    events.send(ClientEvent::QrIssued("2@a".into())).unwrap();
    settle().await;

    assert_ok!(h.manager.pair("s1", Some("12345678901")).await);

    assert_eq!(h.factory.connect_count(), 1);
    let status = h.manager.status("s1").await.unwrap();
    assert!(status.has_pairing_code);
    assert!(!status.has_qr);

    // QR refreshes after the code was issued are ignored
    events.send(ClientEvent::QrIssued("2@b".into())).unwrap();
    settle().await;
    assert_eq!(
        h.manager.status("s1").await.unwrap().status,
        SessionStatus::PairingCodeReady
    );
}

#[tokio::test(start_paused = true)]
async fn pairing_failure_carries_client_message() {
    let h = harness();
    *h.factory.pairing_code.lock().unwrap() =
        Err(ClientError::RequestFailed("Connection Closed".into()));

    let err = h.manager.pair("s1", Some("12345678901")).await.unwrap_err();

    assert!(matches!(err, SessionError::PairingFailed(_)));
    assert_eq!(
        err.to_string(),
        "Failed to generate pairing code: Connection Closed"
    );
    assert_eq!(
        h.manager.status("s1").await.unwrap().status,
        SessionStatus::Initializing
    );
}

#[tokio::test(start_paused = true)]
async fn connect_failure_is_reported() {
    let h = harness();
    h.factory.fail_connect.store(true, Ordering::SeqCst);

    let err = h.manager.create("s1").await.unwrap_err();

    assert!(matches!(err, SessionError::CreationFailed(_)));
    assert!(h.manager.status("s1").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn destroy_unknown_session_is_fine() {
    let h = harness();
    h.manager.destroy("nope").await;
    assert!(h.manager.status("nope").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn destroy_swallows_logout_failure() {
    let h = harness();
    h.manager.create("s1").await.unwrap();
    let (client, _) = h.factory.latest();
    client.logout_fails.store(true, Ordering::SeqCst);
    h.store
        .save("s1", &Credentials::new(json!({"k": 1})))
        .unwrap();

    h.manager.destroy("s1").await;

    assert_eq!(client.logout_calls.load(Ordering::SeqCst), 1);
    assert!(client.is_closed());
    assert!(h.manager.status("s1").await.is_none());
    assert_eq!(h.store.load("s1").unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn credentials_are_saved_and_offered_on_next_connect() {
    let h = harness();
    h.manager.create("s1").await.unwrap();
    let creds = Credentials::new(json!({"me": {"id": "123:4@s.net"}}));
    let (_, events) = h.factory.latest();

    events
        .send(ClientEvent::CredentialsUpdated(creds.clone()))
        .unwrap();
    settle().await;
    assert_eq!(h.store.load("s1").unwrap(), Some(creds.clone()));

    h.manager.create("s1").await.unwrap();
    assert_eq!(h.factory.options(0).credentials, None);
    assert_eq!(h.factory.options(1).credentials, Some(creds));
}

#[tokio::test(start_paused = true)]
async fn recoverable_close_reconnects_after_delay() {
    let h = harness();
    h.manager.create("s1").await.unwrap();
    let (first, events) = h.factory.latest();
    events.send(ClientEvent::QrIssued("2@a".into())).unwrap();
    events
        .send(ClientEvent::ConnectionClosed(DisconnectReason::ConnectionLost))
        .unwrap();
    settle().await;

    let status = h.manager.status("s1").await.unwrap();
    assert_eq!(status.status, SessionStatus::Initializing);
    assert!(!status.has_qr);
    assert_eq!(h.factory.connect_count(), 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    settle().await;

    assert_eq!(h.factory.connect_count(), 2);
    assert!(first.is_closed());
    assert_eq!(h.manager.get_active_session_count().await, 1);

    let (_, events) = h.factory.latest();
    events.send(ClientEvent::ConnectionOpened).unwrap();
    settle().await;
    assert!(h.manager.status("s1").await.unwrap().connected);
}

#[tokio::test(start_paused = true)]
async fn default_policy_keeps_reconnecting() {
    let h = harness();
    h.manager.create("s1").await.unwrap();

    for close in 1..=12 {
        let (_, events) = h.factory.latest();
        events
            .send(ClientEvent::ConnectionClosed(DisconnectReason::ConnectionLost))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(h.factory.connect_count(), close + 1);
        assert_eq!(h.manager.get_active_session_count().await, 1);
    }

    let (_, events) = h.factory.latest();
    events.send(ClientEvent::ConnectionOpened).unwrap();
    settle().await;
    assert!(h.manager.status("s1").await.unwrap().connected);
}

#[tokio::test(start_paused = true)]
async fn destroy_during_reconnect_delay_cancels_it() {
    let h = harness();
    h.manager.create("s1").await.unwrap();
    let (_, events) = h.factory.latest();
    events
        .send(ClientEvent::ConnectionClosed(DisconnectReason::RestartRequired))
        .unwrap();
    settle().await;

    h.manager.destroy("s1").await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(h.factory.connect_count(), 1);
    assert!(h.manager.status("s1").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn logged_out_close_removes_session_and_credentials() {
    let h = harness();
    h.manager.create("s1").await.unwrap();
    h.store
        .save("s1", &Credentials::new(json!({"k": 1})))
        .unwrap();
    let (client, events) = h.factory.latest();

    events
        .send(ClientEvent::ConnectionClosed(DisconnectReason::LoggedOut))
        .unwrap();
    settle().await;

    assert!(h.manager.status("s1").await.is_none());
    assert!(client.is_closed());
    assert_eq!(h.store.load("s1").unwrap(), None);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.factory.connect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_remove_session_but_keep_credentials() {
    let h = harness_with(RetryPolicy {
        initial_delay_ms: 1000,
        multiplier: 1.0,
        max_delay_ms: 1000,
        max_attempts: 1,
    });
    h.manager.create("s1").await.unwrap();
    h.store
        .save("s1", &Credentials::new(json!({"k": 1})))
        .unwrap();
    let close = ClientEvent::ConnectionClosed(DisconnectReason::ConnectionLost);

    let (_, events) = h.factory.latest();
    events.send(close.clone()).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.factory.connect_count(), 2);

    let (_, events) = h.factory.latest();
    events.send(close).unwrap();
    settle().await;

    assert!(h.manager.status("s1").await.is_none());
    assert!(h.store.load("s1").unwrap().is_some());
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(h.factory.connect_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_every_client() {
    let h = harness();
    h.manager.create("a").await.unwrap();
    h.manager.create("b").await.unwrap();

    h.manager.shutdown_all_sessions().await;

    assert_eq!(h.manager.get_active_session_count().await, 0);
    assert!(h.factory.connection(0).0.is_closed());
    assert!(h.factory.connection(1).0.is_closed());
}
