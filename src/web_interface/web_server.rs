use std::net::SocketAddr;
use std::sync::Arc;

use log::info;
use warp::Filter;

use super::routes::gateway_routes;
use crate::error_handling::types::WebError;
use crate::session_management::SessionManager;

/// Web server for the session API and the browser page
pub struct WebServer {
    session_manager: Arc<SessionManager>,
    serve_ui: bool,
}

impl WebServer {
    pub fn new(session_manager: Arc<SessionManager>, serve_ui: bool) -> Self {
        Self {
            session_manager,
            serve_ui,
        }
    }

    /// Serve until the returned future is dropped.
    pub async fn start(&self, addr: SocketAddr) -> Result<(), WebError> {
        // warp panics when it cannot bind, so try the address first
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| WebError::BindFailed(format!("{}: {}", addr, e)))?;
        drop(listener);

        let routes = gateway_routes(self.session_manager.clone(), self.serve_ui)
            .with(warp::log("pairgate::http"));

        info!(
            "Web server listening on http://{} (browser page {})",
            addr,
            if self.serve_ui { "enabled" } else { "disabled" }
        );
        warp::serve(routes).run(addr).await;
        Ok(())
    }
}
