//! HTTP surface: the `/api/session` endpoint and the embedded browser page.

pub mod assets;
pub mod routes;
pub mod types;
pub mod web_server;

pub use routes::{dispatch, ApiReply};
pub use types::{Action, SessionParams};
pub use web_server::WebServer;
