use super::types::Credentials;
use crate::error_handling::types::CredentialError;

/// Storage backend for per-session credentials.
///
/// Implementors are keyed by the session id exactly as the caller supplied
/// it; any escaping needed by the backend is its own concern.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored credentials, or `None` if the session has none yet.
    fn load(&self, session_id: &str) -> Result<Option<Credentials>, CredentialError>;

    /// Replaces whatever was stored for the session.
    fn save(&self, session_id: &str, credentials: &Credentials) -> Result<(), CredentialError>;

    /// Deletes the session's credentials. Removing a missing entry is not an error.
    fn remove(&self, session_id: &str) -> Result<(), CredentialError>;
}
