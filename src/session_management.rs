//! Session management core module.
//!
//! This module provides the core types and submodules for linking sessions:
//! the status and linking-method types, the pure lifecycle transition, the
//! registry holding live sessions, and the manager implementing the
//! create/pair/status/destroy operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Submodule for the event-driven state transition.
pub mod lifecycle;
/// Submodule for phone-number and pairing-code handling.
pub mod pairing;
/// Submodule for the in-memory session registry.
pub mod registry;
/// Submodule for session data structures and utilities.
pub mod session;
/// Submodule for session manager implementation.
pub mod session_manager;
#[cfg(test)]
mod tests;

pub use lifecycle::{Effect, SessionState};
pub use registry::SessionRegistry;
pub use session::{default_session_id, Session, SessionSnapshot};
pub use session_manager::{
    CreateOutcome, ManagerSettings, PairingOutcome, QrReport, SessionManager, StatusReport,
};

/// Represents the current status of a session.
///
/// Variants:
/// - `Initializing`: client started, nothing received from the network yet
/// - `QrReady`: a login QR is waiting to be scanned
/// - `PairingCodeReady`: a pairing code was issued for a phone number
/// - `Connected`: the account is linked and the connection is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initializing,
    QrReady,
    PairingCodeReady,
    Connected,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initializing => "initializing",
            SessionStatus::QrReady => "qr_ready",
            SessionStatus::PairingCodeReady => "pairing_code_ready",
            SessionStatus::Connected => "connected",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the session is currently being linked. A session shows either a QR
/// or a pairing code, never both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkingMethod {
    #[default]
    None,
    Qr(String),
    PairingCode(String),
}

impl LinkingMethod {
    pub fn qr_payload(&self) -> Option<&str> {
        match self {
            LinkingMethod::Qr(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn pairing_code(&self) -> Option<&str> {
        match self {
            LinkingMethod::PairingCode(code) => Some(code),
            _ => None,
        }
    }
}
