//! Per-session authentication material.
//!
//! The messaging client hands out opaque credential blobs whenever its keys
//! change; they are written here under the session id so a reconnect can
//! resume without a new QR scan.
//!
//! Re-exports:
//! - [`CredentialStore`]: the storage interface
//! - [`FileCredentialStore`]: one JSON document per session on disk
//! - [`MemoryCredentialStore`]: process-local map, used when nothing may touch the disk

pub mod file_store;
pub mod memory_store;
pub mod store_trait;
pub mod types;

pub use file_store::FileCredentialStore;
pub use memory_store::MemoryCredentialStore;
pub use store_trait::CredentialStore;
pub use types::Credentials;
