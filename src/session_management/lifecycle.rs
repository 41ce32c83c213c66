use super::{LinkingMethod, SessionStatus};
use crate::credential_store::Credentials;
use crate::messaging_client::ClientEvent;

/// What the manager must do after an event has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    PersistCredentials(Credentials),
    /// The connection dropped; `attempt` counts consecutive drops since the last open.
    Reconnect { attempt: u32 },
    /// The account logged out; the session is over.
    Remove,
}

/// The part of a session driven by client events.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub linking: LinkingMethod,
    pub reconnect_attempts: u32,
}

impl SessionState {
    pub fn new(reconnect_attempts: u32) -> Self {
        Self {
            status: SessionStatus::Initializing,
            linking: LinkingMethod::None,
            reconnect_attempts,
        }
    }

    pub fn apply(&mut self, event: ClientEvent) -> Effect {
        match event {
            ClientEvent::QrIssued(payload) => {
                // a pairing code or an open connection supersedes QR refreshes
                if matches!(
                    self.status,
                    SessionStatus::PairingCodeReady | SessionStatus::Connected
                ) {
                    return Effect::None;
                }
                self.status = SessionStatus::QrReady;
                self.linking = LinkingMethod::Qr(payload);
                Effect::None
            }
            ClientEvent::ConnectionOpened => {
                self.status = SessionStatus::Connected;
                self.linking = LinkingMethod::None;
                self.reconnect_attempts = 0;
                Effect::None
            }
            ClientEvent::ConnectionClosed(reason) if reason.is_terminal() => Effect::Remove,
            ClientEvent::ConnectionClosed(_) => {
                self.status = SessionStatus::Initializing;
                self.linking = LinkingMethod::None;
                self.reconnect_attempts = self.reconnect_attempts.saturating_add(1);
                Effect::Reconnect {
                    attempt: self.reconnect_attempts,
                }
            }
            ClientEvent::CredentialsUpdated(credentials) => Effect::PersistCredentials(credentials),
        }
    }

    /// Records a pairing code returned by the client. Returns `false` when
    /// the session is already connected and the code was not recorded.
    pub fn record_pairing_code(&mut self, code: String) -> bool {
        if self.status == SessionStatus::Connected {
            return false;
        }
        self.status = SessionStatus::PairingCodeReady;
        self.linking = LinkingMethod::PairingCode(code);
        true
    }
}
