//! Hub configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

/// Default per-connection mailbox capacity.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Default capacity of the coordinator's request queue.
pub const DEFAULT_COMMAND_CAPACITY: usize = 1024;

/// Top-level service configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Frames a connection's mailbox holds before new ones are dropped.
    pub mailbox_capacity: usize,

    /// Requests the coordinator queue holds before callers wait.
    pub command_capacity: usize,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub log_json: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            log_json: false,
        }
    }
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or does not parse.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    /// Capacities are clamped to at least one.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let mailbox_capacity = parse_env("MAILBOX_CAPACITY", DEFAULT_MAILBOX_CAPACITY).max(1);
        let command_capacity = parse_env("HUB_COMMAND_CAPACITY", DEFAULT_COMMAND_CAPACITY).max(1);
        let log_json = parse_env_bool("LOG_JSON", false);

        Ok(Self {
            listen_addr,
            mailbox_capacity,
            command_capacity,
            log_json,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|v| v.to_ascii_lowercase())
        .as_deref()
    {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_small_and_positive() {
        let cfg = HubConfig::default();
        assert_eq!(cfg.mailbox_capacity, 256);
        assert!(cfg.command_capacity >= 1);
        assert!(!cfg.log_json);
    }

    #[test]
    fn missing_variables_use_defaults() {
        assert_eq!(parse_env("REALTIME_HUB_TEST_UNSET_NUMBER", 7usize), 7);
        assert!(parse_env_bool("REALTIME_HUB_TEST_UNSET_BOOL", true));
    }
}
