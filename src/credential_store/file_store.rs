use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::{debug, error, info};

use super::store_trait::CredentialStore;
use super::types::Credentials;
use crate::error_handling::types::CredentialError;

/// Writes each session's credentials to `<base>/<encoded id>.json`.
///
/// Session ids come straight from HTTP callers, so they are base64url-encoded
/// before being used as file names.
pub struct FileCredentialStore {
    base_path: PathBuf,
}

impl FileCredentialStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, CredentialError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| {
            error!(
                "Failed to create credentials dir {}: {}",
                base_path.display(),
                e
            );
            CredentialError::IoError(e)
        })?;
        info!("FileCredentialStore initialized at {}", base_path.display());
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, session_id: &str) -> PathBuf {
        let encoded = URL_SAFE_NO_PAD.encode(session_id.as_bytes());
        self.base_path.join(format!("{}.json", encoded))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, session_id: &str) -> Result<Option<Credentials>, CredentialError> {
        let path = self.file_path(session_id);
        let content = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                error!("Failed to read credentials {}: {}", path.display(), e);
                return Err(CredentialError::ReadFailed);
            }
        };
        let credentials = serde_json::from_slice(&content).map_err(|e| {
            error!("Corrupt credentials file {}: {}", path.display(), e);
            CredentialError::SerializationFailed(e.to_string())
        })?;
        debug!("Loaded credentials for session {}", session_id);
        Ok(Some(credentials))
    }

    fn save(&self, session_id: &str, credentials: &Credentials) -> Result<(), CredentialError> {
        let path = self.file_path(session_id);
        let tmp_path = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec(credentials)
            .map_err(|e| CredentialError::SerializationFailed(e.to_string()))?;

        fs::write(&tmp_path, bytes).map_err(|e| {
            error!("Failed to write credentials {}: {}", tmp_path.display(), e);
            CredentialError::WriteFailed
        })?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            error!("Failed to move credentials into {}: {}", path.display(), e);
            CredentialError::WriteFailed
        })?;
        debug!("Saved credentials for session {}", session_id);
        Ok(())
    }

    fn remove(&self, session_id: &str) -> Result<(), CredentialError> {
        let path = self.file_path(session_id);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed credentials for session {}", session_id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Failed to remove credentials {}: {}", path.display(), e);
                Err(CredentialError::IoError(e))
            }
        }
    }
}
