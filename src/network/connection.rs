//! Client Connection
//!
//! Owns the TCP stream to one server and performs blocking round trips.

use std::io::{self, BufReader, BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{ErrorCode, Result, TyrantError};
use crate::protocol::{read_reply, write_command, Command, Reply, ReplyShape};

/// A single connection to the store
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Resolve `host` and connect to the first address that accepts
    pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<Self> {
        let timeout = timeout.filter(|t| !t.is_zero());
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| TyrantError::transport(ErrorCode::NoHost, e))?
            .collect();

        if addrs.is_empty() {
            return Err(TyrantError::transport(
                ErrorCode::NoHost,
                io::Error::new(io::ErrorKind::NotFound, format!("no address for {}", host)),
            ));
        }

        let mut last_error = None;
        for addr in &addrs {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Self::from_stream(stream, timeout),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        let source = last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::ConnectionRefused));
        Err(TyrantError::transport(ErrorCode::Refused, source))
    }

    /// Wrap an already connected stream
    pub fn from_stream(stream: TcpStream, timeout: Option<Duration>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream
            .set_nodelay(true)
            .map_err(|e| TyrantError::transport(ErrorCode::Misc, e))?;

        let read_stream = stream
            .try_clone()
            .map_err(|e| TyrantError::transport(ErrorCode::Misc, e))?;

        let mut connection = Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr,
        };
        connection.set_timeout(timeout)?;

        tracing::debug!("Connected to {}", connection.peer_addr);
        Ok(connection)
    }

    /// Apply a read/write timeout (None = block forever)
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.filter(|t| !t.is_zero());
        let apply = |stream: &TcpStream| -> io::Result<()> {
            stream.set_read_timeout(timeout)?;
            stream.set_write_timeout(timeout)
        };
        apply(self.reader.get_ref())
            .and_then(|_| apply(self.writer.get_ref()))
            .map_err(|e| TyrantError::transport(ErrorCode::Invalid, e))
    }

    /// Send a command and read its reply
    ///
    /// Returns `None` for commands the server never answers (`putnr`).
    pub fn request(&mut self, command: &Command) -> Result<Option<Reply>> {
        let command_type = command.command_type();
        tracing::trace!("-> {} {:?}", self.peer_addr, command_type);

        write_command(&mut self.writer, command)?;

        if command_type.reply_shape() == ReplyShape::None {
            return Ok(None);
        }

        let reply = read_reply(&mut self.reader, command_type)?;
        tracing::trace!("<- {} {:?} status={}", self.peer_addr, command_type, reply.status);
        Ok(Some(reply))
    }

    /// Flush pending output and shut the socket down in both directions
    pub fn shutdown(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| TyrantError::transport(ErrorCode::Send, e))?;

        match self.writer.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Peer already went away; nothing left to release
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TyrantError::transport(ErrorCode::Misc, e)),
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
