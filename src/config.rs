//! Configuration for TyrantKV handles
//!
//! Centralized connection settings with sensible defaults.

use std::time::Duration;

use crate::error::{Result, TyrantError};
use crate::options::TuneOptions;

/// Default server host
pub const DEFAULT_HOST: &str = "localhost";

/// Default server port
pub const DEFAULT_PORT: u16 = 1978;

/// Connection configuration for a [`Handle`](crate::Handle)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Server host name or address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Socket timeout applied to connect, read and write (None = block forever)
    pub timeout: Option<Duration>,

    // -------------------------------------------------------------------------
    // Behavior Configuration
    // -------------------------------------------------------------------------
    /// Connection-level tuning flags
    pub options: TuneOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: None,
            options: TuneOptions::NONE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` form used for resolution and logging
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Convert a timeout in seconds (0 = none) into a socket timeout
pub fn timeout_from_secs(secs: f64) -> Result<Option<Duration>> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(TyrantError::InvalidArgument(format!(
            "timeout must be a non-negative number of seconds, got {}",
            secs
        )));
    }
    if secs == 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(secs).map(Some).map_err(|e| {
        TyrantError::InvalidArgument(format!("timeout of {} seconds is out of range: {}", secs, e))
    })
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the socket timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Set the tuning flags
    pub fn options(mut self, options: TuneOptions) -> Self {
        self.config.options = options;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
