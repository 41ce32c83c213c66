use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

/// Command-line arguments.
///
/// Every flag can also be given through a `PAIRGATE_*` environment variable.
/// Flags take precedence over the configuration file, which takes precedence
/// over the built-in defaults.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "pairgate")]
#[command(version)]
#[command(about = "HTTP gateway for linking messaging accounts by QR code or pairing code")]
pub struct CliArgs {
    /// Path to a TOML configuration file
    #[arg(long, short = 'c', env = "PAIRGATE_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[arg(long, env = "PAIRGATE_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Port the HTTP server listens on
    #[arg(long, short = 'p', env = "PAIRGATE_PORT")]
    pub port: Option<u16>,

    /// Directory where per-session credentials are written
    #[arg(long, env = "PAIRGATE_CREDENTIALS_DIR")]
    pub credentials_dir: Option<PathBuf>,

    /// Do not serve the embedded browser page
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_ui: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "PAIRGATE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Application configuration.
///
/// # Fields Overview
///
/// - `server`: HTTP binding and whether the browser page is served
/// - `sessions`: create wait and credential directory
/// - `client`: identity presented to the messaging network
/// - `reconnect`: schedule used after a non-terminal disconnect
#[derive(Debug, PartialEq, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub sessions: SessionsConfig,
    pub client: ClientConfig,
    pub reconnect: RetryPolicy,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::TomlError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the effective configuration: file (if any), then CLI/env overrides.
    pub fn load(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match &args.config_file {
            Some(path) => Self::from_file(path)?,
            None => {
                debug!("No configuration file given, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&mut self, args: &CliArgs) {
        if let Some(address) = &args.bind_address {
            self.server.bind_address = address.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(dir) = &args.credentials_dir {
            self.sessions.credentials_dir = dir.clone();
        }
        if args.no_ui {
            self.server.serve_ui = false;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind_address
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::BadAddressFormatting(format!("{}: {}", self.server.bind_address, e))
            })?;
        if self.client.display_name.trim().is_empty() {
            return Err(ConfigError::EmptyValue(String::from("client.display_name")));
        }
        if self.client.qr_refresh_ms == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "client.qr_refresh_ms must be greater than 0",
            )));
        }
        if self.reconnect.initial_delay_ms == 0 {
            return Err(ConfigError::NotInRange(String::from(
                "reconnect.initial_delay_ms must be greater than 0",
            )));
        }
        if !(self.reconnect.multiplier >= 1.0) {
            return Err(ConfigError::NotInRange(String::from(
                "reconnect.multiplier must be at least 1.0",
            )));
        }
        if self.reconnect.max_delay_ms < self.reconnect.initial_delay_ms {
            return Err(ConfigError::NotInRange(String::from(
                "reconnect.max_delay_ms must not be lower than reconnect.initial_delay_ms",
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.server.bind_address.parse::<IpAddr>().map_err(|e| {
            ConfigError::BadAddressFormatting(format!("{}: {}", self.server.bind_address, e))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
