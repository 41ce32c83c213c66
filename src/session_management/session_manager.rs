use crate::configuration::{Config, RetryPolicy};
use crate::credential_store::CredentialStore;
use crate::error_handling::types::SessionError;
use crate::messaging_client::{
    BrowserIdentity, ClientConnection, ClientEvent, ClientFactory, ClientOptions,
};
use crate::qr_render;
use crate::session_management::lifecycle::Effect;
use crate::session_management::pairing;
use crate::session_management::registry::SessionRegistry;
use crate::session_management::session::{Session, SessionSnapshot};
use crate::session_management::SessionStatus;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Tunables the manager reads on every operation.
#[derive(Debug, Clone)]
pub struct ManagerSettings {
    pub create_wait: Duration,
    pub display_name: String,
    pub browser: BrowserIdentity,
    pub retry: RetryPolicy,
}

impl ManagerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            create_wait: config.sessions.create_wait(),
            display_name: config.client.display_name.clone(),
            browser: BrowserIdentity {
                name: config.client.display_name.clone(),
                browser: config.client.browser.clone(),
                version: config.client.browser_version.clone(),
            },
            retry: config.reconnect.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    pub session_id: String,
    pub status: SessionStatus,
    /// Rendered QR image, when one had arrived by the end of the wait.
    pub qr: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairingOutcome {
    pub session_id: String,
    pub phone_number: String,
    pub pairing_code: String,
    pub raw_code: String,
    pub instructions: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub session_id: String,
    pub status: SessionStatus,
    pub has_qr: bool,
    pub has_pairing_code: bool,
    pub connected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QrReport {
    pub session_id: String,
    pub qr: Option<String>,
}

/// The structure related to session management
///
/// Owns the registry and turns the four public operations into client
/// calls. Each live session has an event pump task feeding client events
/// through [`SessionState::apply`](super::SessionState::apply) and carrying
/// out the returned [`Effect`].
///
/// # Fields Overview
///
/// - `registry`: live sessions keyed by id
/// - `factory`: creates one messaging client per connection attempt
/// - `credentials`: per-session authentication material
/// - `settings`: create wait, client identity, reconnect policy
/// - `next_generation`: source of generation tokens for registry entries
pub struct SessionManager {
    registry: SessionRegistry,
    factory: Arc<dyn ClientFactory>,
    credentials: Arc<dyn CredentialStore>,
    settings: ManagerSettings,
    next_generation: AtomicU64,
}

impl SessionManager {
    pub fn new(
        factory: Arc<dyn ClientFactory>,
        credentials: Arc<dyn CredentialStore>,
        settings: ManagerSettings,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            factory,
            credentials,
            settings,
            next_generation: AtomicU64::new(0),
        }
    }

    /// Starts (or restarts) the session and reports what the client produced
    /// during the create wait. Callers are expected to poll `status` after.
    pub async fn create(self: &Arc<Self>, session_id: &str) -> Result<CreateOutcome, SessionError> {
        self.start_session(session_id, 0, None).await?;
        tokio::time::sleep(self.settings.create_wait).await;

        let (status, qr) = match self.registry.snapshot(session_id).await {
            Some(snapshot) => (snapshot.status, render_qr(&snapshot)),
            None => {
                warn!("Session {} ended before create returned", session_id);
                (SessionStatus::Initializing, None)
            }
        };
        Ok(CreateOutcome {
            session_id: session_id.to_string(),
            status,
            qr,
        })
    }

    /// Requests a pairing code for `phone_number`, creating the session first
    /// if needed. The number is validated before anything else happens.
    pub async fn pair(
        self: &Arc<Self>,
        session_id: &str,
        phone_number: Option<&str>,
    ) -> Result<PairingOutcome, SessionError> {
        let phone_number = pairing::normalize_phone_number(phone_number)?;

        let (client, generation) = match self.registry.client(session_id).await {
            Some(found) => found,
            None => {
                self.start_session(session_id, 0, None).await?;
                self.registry
                    .client(session_id)
                    .await
                    .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?
            }
        };

        let raw_code = client
            .request_pairing_code(&phone_number)
            .await
            .map_err(|e| {
                warn!("Pairing code request failed for session {}: {}", session_id, e);
                SessionError::PairingFailed(e)
            })?;

        let recorded = self
            .registry
            .update(session_id, generation, |s| {
                s.state.record_pairing_code(raw_code.clone())
            })
            .await;
        if recorded != Some(true) {
            warn!(
                "Session {} moved on while its pairing code was requested",
                session_id
            );
        }

        let formatted = pairing::format_pairing_code(&raw_code);
        info!("Pairing code issued for session {}", session_id);
        Ok(PairingOutcome {
            session_id: session_id.to_string(),
            phone_number,
            instructions: pairing::instructions(&formatted),
            message: pairing::message(&raw_code),
            pairing_code: formatted,
            raw_code,
        })
    }

    /// `None` means the id is unknown or the session has ended.
    pub async fn status(&self, session_id: &str) -> Option<StatusReport> {
        self.registry
            .snapshot(session_id)
            .await
            .map(|snapshot| StatusReport {
                session_id: snapshot.id.clone(),
                status: snapshot.status,
                has_qr: snapshot.has_qr(),
                has_pairing_code: snapshot.has_pairing_code(),
                connected: snapshot.is_connected(),
            })
    }

    pub async fn qr(&self, session_id: &str) -> Option<QrReport> {
        self.registry
            .snapshot(session_id)
            .await
            .map(|snapshot| QrReport {
                session_id: snapshot.id.clone(),
                qr: render_qr(&snapshot),
            })
    }

    /// Logs the account out (best-effort) and forgets the session. Always succeeds.
    pub async fn destroy(&self, session_id: &str) {
        if let Some((client, _)) = self.registry.client(session_id).await {
            if let Err(e) = client.logout().await {
                debug!("Ignoring logout failure for session {}: {}", session_id, e);
            }
        }
        match self.registry.remove(session_id).await {
            Some(session) => {
                session.client.close();
                info!(
                    "Session {} destroyed after {}s",
                    session_id,
                    session.age_secs()
                );
            }
            None => debug!("Destroy of unknown session {}", session_id),
        }
        if let Err(e) = self.credentials.remove(session_id) {
            warn!("Could not remove credentials of session {}: {}", session_id, e);
        }
    }

    pub async fn get_active_session_count(&self) -> usize {
        self.registry.len().await
    }

    /// Closes every client without logging out, so credentials stay valid for the next run.
    pub async fn shutdown_all_sessions(&self) {
        let sessions = self.registry.drain().await;
        for session in &sessions {
            session.client.close();
        }
        info!("Closed {} session(s)", sessions.len());
    }

    /// Connects a new client for `session_id` and registers it.
    ///
    /// With `expected_generation` set, the entry is only replaced if it still
    /// belongs to that generation; this is how a scheduled reconnect avoids
    /// resurrecting a session destroyed while it waited.
    async fn start_session(
        self: &Arc<Self>,
        session_id: &str,
        reconnect_attempts: u32,
        expected_generation: Option<u64>,
    ) -> Result<u64, SessionError> {
        let credentials = match self.credentials.load(session_id) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(
                    "Ignoring unreadable credentials of session {}: {}",
                    session_id, e
                );
                None
            }
        };
        let options = ClientOptions {
            display_name: self.settings.display_name.clone(),
            browser: self.settings.browser.clone(),
            credentials,
        };

        let ClientConnection { client, events } = self
            .factory
            .connect(session_id, options)
            .await
            .map_err(|e| {
                error!("Client for session {} failed to start: {}", session_id, e);
                SessionError::CreationFailed(e)
            })?;

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = Session::new(
            session_id,
            Arc::clone(&client),
            generation,
            reconnect_attempts,
        );

        let replaced = match expected_generation {
            None => self.registry.insert(session).await,
            Some(expected) => match self.registry.replace_generation(session, expected).await {
                Ok(replaced) => replaced,
                Err(_) => {
                    debug!(
                        "Session {} was removed during reconnect, dropping new client",
                        session_id
                    );
                    client.close();
                    return Err(SessionError::NotFound(session_id.to_string()));
                }
            },
        };
        if let Some(previous) = replaced {
            debug!(
                "Session {} client replaced (generation {} -> {})",
                session_id, previous.generation, generation
            );
            previous.client.close();
        }

        let manager = Arc::clone(self);
        let id = session_id.to_string();
        tokio::spawn(async move {
            manager.pump_events(id, generation, events).await;
        });

        info!("Session {} started (generation {})", session_id, generation);
        Ok(generation)
    }

    async fn pump_events(
        self: Arc<Self>,
        session_id: String,
        generation: u64,
        mut events: UnboundedReceiver<ClientEvent>,
    ) {
        while let Some(event) = events.recv().await {
            debug!(
                "Session {} (generation {}) event {}",
                session_id,
                generation,
                event.name()
            );
            let reason = match &event {
                ClientEvent::ConnectionClosed(reason) => Some(*reason),
                _ => None,
            };

            let effect = self
                .registry
                .update(&session_id, generation, |s| s.state.apply(event))
                .await;
            let effect = match effect {
                Some(effect) => effect,
                None => {
                    debug!(
                        "Session {} generation {} superseded, stopping event pump",
                        session_id, generation
                    );
                    break;
                }
            };

            match effect {
                Effect::None => {}
                Effect::PersistCredentials(credentials) => {
                    if let Err(e) = self.credentials.save(&session_id, &credentials) {
                        warn!("Could not save credentials of session {}: {}", session_id, e);
                    }
                }
                Effect::Reconnect { attempt } => {
                    let code = reason.map(|r| r.status_code()).unwrap_or_default();
                    self.handle_disconnect(&session_id, generation, attempt, code)
                        .await;
                    break;
                }
                Effect::Remove => {
                    info!("Session {} logged out", session_id);
                    self.discard(&session_id, generation, true).await;
                    break;
                }
            }
        }
        debug!("Event pump for session {} (generation {}) finished", session_id, generation);
    }

    async fn handle_disconnect(
        self: &Arc<Self>,
        session_id: &str,
        generation: u64,
        attempt: u32,
        status_code: u16,
    ) {
        match self.settings.retry.delay_for(attempt) {
            Some(delay) => {
                info!(
                    "Session {} closed (code {}), reconnect attempt {} in {:?}",
                    session_id, status_code, attempt, delay
                );
                self.schedule_reconnect(session_id.to_string(), generation, attempt, delay);
            }
            None => {
                warn!(
                    "Session {} closed (code {}) and reconnect attempts are exhausted",
                    session_id, status_code
                );
                self.discard(session_id, generation, false).await;
            }
        }
    }

    // Kept synchronous: it spawns `start_session`, which in turn spawns the
    // event pump that calls back here.
    fn schedule_reconnect(
        self: &Arc<Self>,
        session_id: String,
        generation: u64,
        attempt: u32,
        delay: Duration,
    ) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if manager.registry.generation_of(&session_id).await != Some(generation) {
                debug!("Reconnect of session {} cancelled", session_id);
                return;
            }
            match manager
                .start_session(&session_id, attempt, Some(generation))
                .await
            {
                Ok(_) => {}
                Err(SessionError::NotFound(_)) => {}
                Err(e) => {
                    let next = attempt.saturating_add(1);
                    let _ = manager
                        .registry
                        .update(&session_id, generation, |s| s.state.reconnect_attempts = next)
                        .await;
                    match manager.settings.retry.delay_for(next) {
                        Some(delay) => {
                            warn!(
                                "Reconnect of session {} failed ({}), retrying in {:?}",
                                session_id, e, delay
                            );
                            manager.schedule_reconnect(session_id, generation, next, delay);
                        }
                        None => {
                            warn!(
                                "Reconnect of session {} failed ({}), giving up",
                                session_id, e
                            );
                            manager.discard(&session_id, generation, false).await;
                        }
                    }
                }
            }
        });
    }

    async fn discard(&self, session_id: &str, generation: u64, forget_credentials: bool) {
        if let Some(session) = self.registry.remove_generation(session_id, generation).await {
            session.client.close();
            info!(
                "Session {} removed after {}s",
                session_id,
                session.age_secs()
            );
        }
        if forget_credentials {
            if let Err(e) = self.credentials.remove(session_id) {
                warn!("Could not remove credentials of session {}: {}", session_id, e);
            }
        }
    }
}

fn render_qr(snapshot: &SessionSnapshot) -> Option<String> {
    let payload = snapshot.linking.qr_payload()?;
    match qr_render::to_data_url(payload) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!("Could not render QR for session {}: {}", snapshot.id, e);
            None
        }
    }
}
