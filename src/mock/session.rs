//! Session Handler
//!
//! Serves one client connection of the mock server.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, TyrantError};
use crate::protocol::{read_command, write_reply, Command, Reply};

use super::store::{IterCursor, MemStore};

/// Handles a single client connection
pub struct Session {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared record store
    store: Arc<MemStore>,

    /// This client's iteration position
    cursor: IterCursor,

    /// Peer address for logging
    peer_addr: String,
}

impl Session {
    /// Create a new session handler
    pub fn new(stream: TcpStream, store: Arc<MemStore>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            cursor: IterCursor::default(),
            peer_addr,
        })
    }

    /// Close idle sessions after `ms` milliseconds without a command (0 = never)
    pub fn set_idle_timeout(&mut self, ms: u64) -> Result<()> {
        if ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(ms)))?;
        }
        Ok(())
    }

    /// Handle the session (blocking until the client goes away)
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Session opened from {}", self.peer_addr);

        loop {
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(ref e) if is_disconnect(e) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Bad request from {}: {}", self.peer_addr, e);
                    let _ = self.send_reply(&Reply::failure());
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command.command_type());

            let Some(reply) = self.execute_command(command) else {
                continue;
            };

            if let Err(e) = self.send_reply(&reply) {
                if is_disconnect(&e) {
                    tracing::debug!(
                        "Client {} disconnected before reply could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    fn execute_command(&mut self, command: Command) -> Option<Reply> {
        self.store.execute(command, &mut self.cursor)
    }

    fn send_reply(&mut self, reply: &Reply) -> Result<()> {
        write_reply(&mut self.writer, reply)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Transport errors that just mean the client is gone or idle
fn is_disconnect(err: &TyrantError) -> bool {
    match err {
        TyrantError::Transport { source, .. } => matches!(
            source.kind(),
            ErrorKind::UnexpectedEof
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
                | ErrorKind::WouldBlock
                | ErrorKind::TimedOut
        ),
        _ => false,
    }
}
