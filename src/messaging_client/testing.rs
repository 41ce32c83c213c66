//! Scriptable client used by unit tests across the crate.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::client::{ClientConnection, ClientEvent, ClientFactory, ClientOptions, MessagingClient};
use crate::error_handling::types::ClientError;

pub struct MockClient {
    pub pairing_code: Mutex<Result<String, ClientError>>,
    pub logout_fails: AtomicBool,
    pub logout_calls: AtomicUsize,
    pub closed: AtomicBool,
    pub last_phone: Mutex<Option<String>>,
}

impl MockClient {
    pub fn new(pairing_code: Result<String, ClientError>) -> Self {
        Self {
            pairing_code: Mutex::new(pairing_code),
            logout_fails: AtomicBool::new(false),
            logout_calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            last_phone: Mutex::new(None),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingClient for MockClient {
    async fn request_pairing_code(&self, phone_number: &str) -> Result<String, ClientError> {
        *self.last_phone.lock().unwrap() = Some(phone_number.to_string());
        self.pairing_code.lock().unwrap().clone()
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.logout_fails.load(Ordering::SeqCst) {
            Err(ClientError::RequestFailed("Connection Closed".into()))
        } else {
            Ok(())
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Handle kept by the test for each connection the factory handed out.
pub struct MockConnection {
    pub session_id: String,
    pub options: ClientOptions,
    pub client: Arc<MockClient>,
    pub events: mpsc::UnboundedSender<ClientEvent>,
}

pub struct MockClientFactory {
    pub connections: Mutex<Vec<MockConnection>>,
    pub fail_connect: AtomicBool,
    pub pairing_code: Mutex<Result<String, ClientError>>,
}

impl Default for MockClientFactory {
    fn default() -> Self {
        Self {
            connections: Mutex::new(Vec::new()),
            fail_connect: AtomicBool::new(false),
            pairing_code: Mutex::new(Ok(String::from("ABCD1234"))),
        }
    }
}

impl MockClientFactory {
    pub fn connect_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    /// Client and event sender of the `index`-th connection.
    pub fn connection(&self, index: usize) -> (Arc<MockClient>, mpsc::UnboundedSender<ClientEvent>) {
        let conns = self.connections.lock().unwrap();
        (Arc::clone(&conns[index].client), conns[index].events.clone())
    }

    pub fn latest(&self) -> (Arc<MockClient>, mpsc::UnboundedSender<ClientEvent>) {
        let index = self.connect_count() - 1;
        self.connection(index)
    }

    pub fn options(&self, index: usize) -> ClientOptions {
        self.connections.lock().unwrap()[index].options.clone()
    }
}

#[async_trait]
impl ClientFactory for MockClientFactory {
    async fn connect(
        &self,
        session_id: &str,
        options: ClientOptions,
    ) -> Result<ClientConnection, ClientError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ClientError::ConnectFailed("network unreachable".into()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let client = Arc::new(MockClient::new(self.pairing_code.lock().unwrap().clone()));
        self.connections.lock().unwrap().push(MockConnection {
            session_id: session_id.to_string(),
            options,
            client: Arc::clone(&client),
            events: tx,
        });
        Ok(ClientConnection { client, events: rx })
    }
}
