//! Seam to the external messaging-protocol library.
//!
//! Everything protocol-specific (socket handling, QR negotiation, key
//! management) lives behind [`ClientFactory`] and [`MessagingClient`]. The
//! gateway only sees the ordered [`ClientEvent`] stream and the two requests
//! it forwards on behalf of HTTP callers.

pub mod client;
pub mod simulated;
#[cfg(test)]
pub mod testing;

pub use client::{
    BrowserIdentity, ClientConnection, ClientEvent, ClientFactory, ClientOptions,
    DisconnectReason, MessagingClient,
};
pub use simulated::SimulatedClientFactory;
