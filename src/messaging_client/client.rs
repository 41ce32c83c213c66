use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::credential_store::Credentials;
use crate::error_handling::types::ClientError;

/// Why the client library closed a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    LoggedOut,
    ConnectionClosed,
    ConnectionLost,
    ConnectionReplaced,
    BadSession,
    RestartRequired,
    Other(u16),
}

impl DisconnectReason {
    pub fn status_code(&self) -> u16 {
        match self {
            DisconnectReason::LoggedOut => 401,
            DisconnectReason::ConnectionClosed => 428,
            DisconnectReason::ConnectionLost => 408,
            DisconnectReason::ConnectionReplaced => 440,
            DisconnectReason::BadSession => 500,
            DisconnectReason::RestartRequired => 515,
            DisconnectReason::Other(code) => *code,
        }
    }

    /// Only a logout ends a session; every other close is worth a reconnect.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DisconnectReason::LoggedOut)
    }
}

/// Notifications emitted by a client, delivered in order on one channel per session.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    ConnectionOpened,
    ConnectionClosed(DisconnectReason),
    QrIssued(String),
    CredentialsUpdated(Credentials),
}

impl ClientEvent {
    /// Short label for logs; never includes payloads or key material.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::ConnectionOpened => "connection.open",
            ClientEvent::ConnectionClosed(_) => "connection.close",
            ClientEvent::QrIssued(_) => "connection.qr",
            ClientEvent::CredentialsUpdated(_) => "creds.update",
        }
    }
}

/// Browser triple the client announces to the network, e.g. `("Pairgate", "Chrome", "1.0.0")`.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserIdentity {
    pub name: String,
    pub browser: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientOptions {
    pub display_name: String,
    pub browser: BrowserIdentity,
    /// Credentials from a previous connection, if the store had any.
    pub credentials: Option<Credentials>,
}

/// A freshly connected client and the receiving end of its event stream.
pub struct ClientConnection {
    pub client: Arc<dyn MessagingClient>,
    pub events: mpsc::UnboundedReceiver<ClientEvent>,
}

/// One live messaging-client instance.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Asks the network for a pairing code linking `phone_number` (digits only).
    async fn request_pairing_code(&self, phone_number: &str) -> Result<String, ClientError>;

    /// Unlinks the device from the account.
    async fn logout(&self) -> Result<(), ClientError>;

    /// Stops the client and drops its event sender. Safe to call more than once.
    fn close(&self);
}

/// Creates clients; one call per session connection attempt.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn connect(
        &self,
        session_id: &str,
        options: ClientOptions,
    ) -> Result<ClientConnection, ClientError>;
}
