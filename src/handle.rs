//! Handle Lifecycle
//!
//! A `Handle` exclusively owns one connection to the store.
//!
//! ## State
//! ```text
//!   open() ──► OPEN ──close()──► CLOSED ──close()──► CLOSED (no-op)
//!              │  ▲                 ▲
//!   transport  │  │ next call       │
//!   failure    ▼  │ (RECONNECT)     │
//!             BROKEN ───close()─────┘
//! ```
//! A failed `open` returns no handle at all. Dropping an open handle closes
//! it, so the connection is released exactly once whichever comes first.
//!
//! After a transport failure the stream may still hold a late reply, so the
//! connection is dropped. Without `RECONNECT` every later call fails fast;
//! with it the next call connects again.

use std::io;

use crate::config::{timeout_from_secs, Config};
use crate::error::{ErrorCode, Result, TyrantError};
use crate::network::Connection;
use crate::options::TuneOptions;
use crate::protocol::{Body, Command, Reply};

enum State {
    Open(Connection),
    /// Connection dropped after a transport failure
    Broken,
    Closed,
}

/// An open connection to the store
pub struct Handle {
    config: Config,
    state: State,
}

impl Handle {
    /// Connect to `host:port`
    pub fn open(host: &str, port: u16) -> Result<Self> {
        Self::open_with(Config::builder().host(host).port(port).build())
    }

    /// Connect using a full configuration
    pub fn open_with(config: Config) -> Result<Self> {
        let connection = Connection::connect(&config.host, config.port, config.timeout)?;
        tracing::debug!("Opened handle to {}", config.addr());

        Ok(Self {
            config,
            state: State::Open(connection),
        })
    }

    /// Apply tuning flags and a timeout in seconds (0 = none)
    ///
    /// Takes effect on the live connection and on any later reconnect.
    pub fn tune(&mut self, options: TuneOptions, timeout_secs: f64) -> Result<()> {
        let timeout = timeout_from_secs(timeout_secs)?;
        if let State::Open(connection) = &mut self.state {
            connection.set_timeout(timeout)?;
        }
        self.config.options = options;
        self.config.timeout = timeout;
        tracing::debug!(
            "Tuned handle to {}: options={:#x} timeout={:?}",
            self.config.addr(),
            options.bits(),
            timeout
        );
        Ok(())
    }

    /// [`tune`](Self::tune) with a raw bitmask from an embedding environment
    pub fn tune_bits(&mut self, options: u32, timeout_secs: f64) -> Result<()> {
        let options = TuneOptions::from_bits(options).ok_or_else(|| {
            TyrantError::InvalidArgument(format!("unknown tuning flags: {:#x}", options))
        })?;
        self.tune(options, timeout_secs)
    }

    /// Close the connection
    ///
    /// Idempotent. If the shutdown fails the handle stays open so the call
    /// can be retried.
    pub fn close(&mut self) -> Result<()> {
        if let State::Open(connection) = &mut self.state {
            connection.shutdown()?;
            tracing::debug!("Closed handle to {}", self.config.addr());
        }
        self.state = State::Closed;
        Ok(())
    }

    /// True until [`close`](Self::close) succeeds
    pub fn is_open(&self) -> bool {
        !matches!(self.state, State::Closed)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    fn connection(&mut self) -> Result<&mut Connection> {
        if matches!(self.state, State::Broken) {
            if !self.config.options.contains(TuneOptions::RECONNECT) {
                return Err(TyrantError::transport(
                    ErrorCode::Invalid,
                    io::Error::new(
                        io::ErrorKind::NotConnected,
                        "connection dropped after an earlier transport failure",
                    ),
                ));
            }
            self.reconnect()?;
        }

        match &mut self.state {
            State::Open(connection) => Ok(connection),
            State::Broken | State::Closed => Err(TyrantError::Closed),
        }
    }

    fn reconnect(&mut self) -> Result<()> {
        tracing::debug!("Reconnecting to {}", self.config.addr());
        let connection = Connection::connect(&self.config.host, self.config.port, self.config.timeout)?;
        self.state = State::Open(connection);
        Ok(())
    }

    /// One round trip; the connection is dropped if the stream was left mid-frame
    fn round_trip(&mut self, command: &Command) -> Result<Option<Reply>> {
        let result = self.connection()?.request(command);
        if let Err(err) = &result {
            if !err.is_local() {
                self.state = State::Broken;
            }
        }
        result
    }

    /// Round trip with a single reconnect-and-retry when tuned for it
    pub(crate) fn call(&mut self, command: &Command) -> Result<Option<Reply>> {
        match self.round_trip(command) {
            Err(err)
                if err.is_transport()
                    && self.config.options.contains(TuneOptions::RECONNECT)
                    && command.command_type().is_retryable(err.code()) =>
            {
                tracing::warn!(
                    "Request to {} failed ({}), reconnecting",
                    self.config.addr(),
                    err
                );
                self.round_trip(command)
            }
            other => other,
        }
    }

    /// Round trip that turns a failure status into the command's remote error
    pub(crate) fn request(&mut self, command: Command) -> Result<Body> {
        match self.call(&command)? {
            Some(reply) => reply.into_result(command.command_type()),
            None => Ok(Body::Empty),
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close handle to {}: {}", self.config.addr(), e);
        }
    }
}
