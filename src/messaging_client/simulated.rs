//! Self-contained client backend.
//!
//! Produces the same event stream shape as a real protocol library (fresh
//! credentials, then a QR payload refreshed on an interval) without talking
//! to any network, so the gateway and its browser page can be run and
//! exercised end to end. Pairing codes are generated locally and nothing
//! ever completes the link, so sessions stay in their linking phase.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use rand::Rng;
use serde_json::json;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use super::client::{
    ClientConnection, ClientEvent, ClientFactory, ClientOptions, DisconnectReason, MessagingClient,
};
use crate::credential_store::Credentials;
use crate::error_handling::types::ClientError;

const PAIRING_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTVWXYZ";
const PAIRING_CODE_LEN: usize = 8;

pub struct SimulatedClientFactory {
    qr_refresh: Duration,
}

impl SimulatedClientFactory {
    pub fn new(qr_refresh: Duration) -> Self {
        Self { qr_refresh }
    }
}

#[async_trait]
impl ClientFactory for SimulatedClientFactory {
    async fn connect(
        &self,
        session_id: &str,
        options: ClientOptions,
    ) -> Result<ClientConnection, ClientError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let resumed = options.credentials.is_some();
        let credentials = options
            .credentials
            .clone()
            .unwrap_or_else(|| fresh_credentials(&options.display_name));

        let client = Arc::new(SimulatedClient {
            session_id: session_id.to_string(),
            events: Mutex::new(Some(events_tx.clone())),
            shutdown: shutdown_tx,
            pairing_requested: Mutex::new(false),
        });

        info!(
            "Simulated client started for session {} as {} ({} {}), resumed: {}",
            session_id,
            options.browser.name,
            options.browser.browser,
            options.browser.version,
            resumed
        );

        if !resumed {
            let _ = events_tx.send(ClientEvent::CredentialsUpdated(credentials.clone()));
        }
        tokio::spawn(run_qr_loop(
            Arc::clone(&client),
            credentials,
            self.qr_refresh,
            shutdown_rx,
        ));

        Ok(ClientConnection {
            client,
            events: events_rx,
        })
    }
}

pub struct SimulatedClient {
    session_id: String,
    events: Mutex<Option<mpsc::UnboundedSender<ClientEvent>>>,
    shutdown: watch::Sender<bool>,
    pairing_requested: Mutex<bool>,
}

impl SimulatedClient {
    fn emit(&self, event: ClientEvent) -> bool {
        match self.events.lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|tx| tx.send(event).is_ok())
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    fn pairing_requested(&self) -> bool {
        self.pairing_requested.lock().map(|p| *p).unwrap_or(false)
    }
}

#[async_trait]
impl MessagingClient for SimulatedClient {
    async fn request_pairing_code(&self, phone_number: &str) -> Result<String, ClientError> {
        if self.is_closed() {
            return Err(ClientError::NotConnected);
        }
        if let Ok(mut requested) = self.pairing_requested.lock() {
            *requested = true;
        }
        let code = generate_pairing_code();
        debug!(
            "Simulated pairing code issued for session {} ({} digits)",
            self.session_id,
            phone_number.len()
        );
        Ok(code)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::NotConnected);
        }
        self.emit(ClientEvent::ConnectionClosed(DisconnectReason::LoggedOut));
        self.close();
        Ok(())
    }

    fn close(&self) {
        let _ = self.shutdown.send(true);
        if let Ok(mut events) = self.events.lock() {
            events.take();
        }
    }
}

async fn run_qr_loop(
    client: Arc<SimulatedClient>,
    credentials: Credentials,
    refresh: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let identity = credentials
        .as_value()
        .get("identity")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    loop {
        if client.pairing_requested() {
            break;
        }
        let payload = format!("2@{},{}", Uuid::new_v4().simple(), identity);
        if !client.emit(ClientEvent::QrIssued(payload)) {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(refresh) => {}
            _ = shutdown.changed() => break,
        }
    }
    debug!("Simulated QR loop stopped for session {}", client.session_id);
}

fn fresh_credentials(display_name: &str) -> Credentials {
    Credentials::new(json!({
        "identity": Uuid::new_v4().simple().to_string(),
        "registrationId": rand::thread_rng().gen::<u16>(),
        "deviceName": display_name,
        "registered": false,
    }))
}

fn generate_pairing_code() -> String {
    let mut rng = rand::thread_rng();
    (0..PAIRING_CODE_LEN)
        .map(|_| PAIRING_ALPHABET[rng.gen_range(0..PAIRING_ALPHABET.len())] as char)
        .collect()
}
