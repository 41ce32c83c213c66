use super::lifecycle::SessionState;
use super::{LinkingMethod, SessionStatus};
use crate::messaging_client::MessagingClient;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A registry entry: lifecycle state plus the client instance driving it.
pub struct Session {
    pub id: String,
    pub state: SessionState,
    pub client: Arc<dyn MessagingClient>,
    /// Identifies which client instance owns the entry; bumps on every (re)connect.
    pub generation: u64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        id: &str,
        client: Arc<dyn MessagingClient>,
        generation: u64,
        reconnect_attempts: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            state: SessionState::new(reconnect_attempts),
            client,
            generation,
            created_at: Utc::now(),
        }
    }

    /// Whole seconds since this client instance was registered.
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.created_at).num_seconds()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            status: self.state.status,
            linking: self.state.linking.clone(),
            generation: self.generation,
            reconnect_attempts: self.state.reconnect_attempts,
        }
    }
}

/// Point-in-time copy of a session, safe to hold across awaits.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub id: String,
    pub status: SessionStatus,
    pub linking: LinkingMethod,
    pub generation: u64,
    pub reconnect_attempts: u32,
}

impl SessionSnapshot {
    pub fn has_qr(&self) -> bool {
        self.linking.qr_payload().is_some()
    }

    pub fn has_pairing_code(&self) -> bool {
        self.linking.pairing_code().is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }
}

/// Id used when the caller does not name the session: `session_<unix millis>`.
pub fn default_session_id() -> String {
    format!("session_{}", Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_counts_from_registration() {
        let client = Arc::new(crate::messaging_client::testing::MockClient::new(Ok(
            String::from("ABCD1234"),
        )));
        let mut session = Session::new("s1", client, 1, 0);
        assert_eq!(session.age_secs(), 0);

        session.created_at = Utc::now() - chrono::Duration::seconds(90);
        assert!(session.age_secs() >= 90);
    }

    #[test]
    fn default_id_is_timestamp_based() {
        let id = default_session_id();
        let millis = id.strip_prefix("session_").unwrap();
        assert!(millis.parse::<i64>().unwrap() > 1_600_000_000_000);
    }
}
