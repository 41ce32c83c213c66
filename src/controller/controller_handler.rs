use std::sync::Arc;
use std::time::Duration;

use log::{error, info};

use crate::configuration::{ClientBackend, Config};
use crate::credential_store::FileCredentialStore;
use crate::error_handling::types::*;
use crate::messaging_client::{ClientFactory, SimulatedClientFactory};
use crate::session_management::{ManagerSettings, SessionManager};
use crate::web_interface::WebServer;

/// Wires the credential store, client backend, session manager and web
/// server together and owns them for the lifetime of the process.
pub struct Controller {
    pub config: Config,
    session_manager: Arc<SessionManager>,
    web_server: WebServer,
}

impl Controller {
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Creating controller");

        let credentials = Arc::new(FileCredentialStore::new(&config.sessions.credentials_dir)?);
        let factory: Arc<dyn ClientFactory> = match config.client.backend {
            ClientBackend::Simulated => {
                info!("Using simulated messaging backend");
                Arc::new(SimulatedClientFactory::new(Duration::from_millis(
                    config.client.qr_refresh_ms,
                )))
            }
        };

        let session_manager = Arc::new(SessionManager::new(
            factory,
            credentials,
            ManagerSettings::from_config(&config),
        ));
        let web_server = WebServer::new(session_manager.clone(), config.server.serve_ui);

        Ok(Self {
            config,
            session_manager,
            web_server,
        })
    }

    pub fn session_manager(&self) -> Arc<SessionManager> {
        self.session_manager.clone()
    }

    /// Serves HTTP until ctrl-c, then closes every live session.
    pub async fn run(&mut self) -> Result<(), ControllerError> {
        let addr = self.config.socket_addr()?;

        let served = tokio::select! {
            result = self.web_server.start(addr) => result,
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => info!("Shutdown signal received"),
                    Err(e) => error!("Unable to listen for shutdown signal: {}", e),
                }
                Ok(())
            }
        };

        self.shutdown().await;
        served.map_err(ControllerError::from)
    }

    pub async fn shutdown(&self) {
        let count = self.session_manager.get_active_session_count().await;
        info!("Shutting down {} active session(s)", count);
        self.session_manager.shutdown_all_sessions().await;
    }
}
