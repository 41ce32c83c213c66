use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub serve_ui: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("0.0.0.0"),
            port: 3000,
            serve_ui: true,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// How long `create` waits for the first QR or connection event.
    pub create_wait_ms: u64,
    /// Directory holding one credential document per session.
    pub credentials_dir: PathBuf,
}

impl SessionsConfig {
    pub fn create_wait(&self) -> Duration {
        Duration::from_millis(self.create_wait_ms)
    }
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            create_wait_ms: 2000,
            credentials_dir: std::env::temp_dir().join("pairgate"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientBackend {
    Simulated,
}

#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: ClientBackend,
    /// Name shown in the phone's linked-devices list.
    pub display_name: String,
    pub browser: String,
    pub browser_version: String,
    /// Interval between QR refreshes of the simulated backend.
    pub qr_refresh_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: ClientBackend::Simulated,
            display_name: String::from("Pairgate Session"),
            browser: String::from("Chrome"),
            browser_version: String::from("1.0.0"),
            qr_refresh_ms: 20_000,
        }
    }
}

/// Reconnect schedule applied after a non-terminal connection close.
///
/// Attempt `n` (1-based) waits `initial_delay_ms * multiplier^(n-1)`, capped
/// at `max_delay_ms`. `max_attempts = 0` retries forever.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Delay before reconnect attempt `attempt`, or `None` once the budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || (self.max_attempts != 0 && attempt > self.max_attempts) {
            return None;
        }
        let exponent = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
        let scaled = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = scaled.min(self.max_delay_ms as f64).max(0.0);
        Some(Duration::from_millis(capped as u64))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 5000,
            multiplier: 1.0,
            max_delay_ms: 60_000,
            max_attempts: 0,
        }
    }
}
