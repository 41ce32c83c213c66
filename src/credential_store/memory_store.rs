use std::collections::HashMap;
use std::sync::Mutex;

use super::store_trait::CredentialStore;
use super::types::Credentials;
use crate::error_handling::types::CredentialError;

#[derive(Default)]
pub struct MemoryCredentialStore {
    entries: Mutex<HashMap<String, Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self, session_id: &str) -> Result<Option<Credentials>, CredentialError> {
        let entries = self.entries.lock().map_err(|_| CredentialError::ReadFailed)?;
        Ok(entries.get(session_id).cloned())
    }

    fn save(&self, session_id: &str, credentials: &Credentials) -> Result<(), CredentialError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CredentialError::WriteFailed)?;
        entries.insert(session_id.to_string(), credentials.clone());
        Ok(())
    }

    fn remove(&self, session_id: &str) -> Result<(), CredentialError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CredentialError::WriteFailed)?;
        entries.remove(session_id);
        Ok(())
    }
}
