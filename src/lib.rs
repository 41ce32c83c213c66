pub mod configuration;
pub mod controller;
pub mod credential_store;
pub mod error_handling;
pub mod messaging_client;
pub mod qr_render;
pub mod session_management;
pub mod web_interface;
