//! Mock TCP Server
//!
//! Accepts connections and runs one session thread per client.

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::{Result, TyrantError};

use super::session::Session;
use super::store::{Extension, MemStore};

/// In-memory server bound to a local address
pub struct MockServer {
    addr: SocketAddr,
    store: Arc<MemStore>,
    shutdown: Arc<AtomicBool>,
    acceptor: Option<JoinHandle<()>>,
}

impl MockServer {
    /// Create a new server builder
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::default()
    }

    /// Start on an ephemeral loopback port with no extensions
    pub fn start() -> Result<Self> {
        Self::builder().start()
    }

    /// Address the server is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Direct access to the backing store
    pub fn store(&self) -> &Arc<MemStore> {
        &self.store
    }

    /// Block until the acceptor exits
    pub fn wait(mut self) {
        if let Some(acceptor) = self.acceptor.take() {
            let _ = acceptor.join();
        }
    }

    /// Stop accepting connections
    ///
    /// Sessions already running finish when their clients disconnect.
    pub fn shutdown(&mut self) {
        let Some(acceptor) = self.acceptor.take() else {
            return;
        };

        self.shutdown.store(true, Ordering::Relaxed);
        // Wake the blocking accept so it observes the flag
        let _ = TcpStream::connect(self.addr);
        let _ = acceptor.join();
        tracing::debug!("Mock server on {} stopped", self.addr);
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builder for MockServer
pub struct MockServerBuilder {
    listen_addr: String,
    idle_timeout_ms: u64,
    extensions: HashMap<Vec<u8>, Extension>,
}

impl Default for MockServerBuilder {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:0".to_string(),
            idle_timeout_ms: 0,
            extensions: HashMap::new(),
        }
    }
}

impl MockServerBuilder {
    /// Set the TCP listen address (port 0 picks a free port)
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    /// Close sessions idle for this long (0 = never)
    pub fn idle_timeout_ms(mut self, ms: u64) -> Self {
        self.idle_timeout_ms = ms;
        self
    }

    /// Register an extension function callable through `ext`
    pub fn extension<F>(mut self, name: &str, function: F) -> Self
    where
        F: Fn(&[u8], &[u8]) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        self.extensions
            .insert(name.as_bytes().to_vec(), Arc::new(function));
        self
    }

    /// Bind and start the acceptor thread
    pub fn start(self) -> Result<MockServer> {
        let listener = TcpListener::bind(&self.listen_addr).map_err(|e| {
            TyrantError::Config(format!("cannot listen on {}: {}", self.listen_addr, e))
        })?;
        let addr = listener.local_addr()?;

        let store = Arc::new(MemStore::new(self.extensions));
        let shutdown = Arc::new(AtomicBool::new(false));
        let idle_timeout_ms = self.idle_timeout_ms;

        let acceptor = {
            let store = Arc::clone(&store);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("tyrantkv-mock-accept".to_string())
                .spawn(move || accept_loop(listener, store, shutdown, idle_timeout_ms))?
        };

        tracing::info!("Mock server listening on {}", addr);

        Ok(MockServer {
            addr,
            store,
            shutdown,
            acceptor: Some(acceptor),
        })
    }
}

fn accept_loop(
    listener: TcpListener,
    store: Arc<MemStore>,
    shutdown: Arc<AtomicBool>,
    idle_timeout_ms: u64,
) {
    for stream in listener.incoming() {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Accept failed: {}", e);
                continue;
            }
        };

        let store = Arc::clone(&store);
        let spawned = thread::Builder::new()
            .name("tyrantkv-mock-session".to_string())
            .spawn(move || {
                let result = Session::new(stream, store).and_then(|mut session| {
                    session.set_idle_timeout(idle_timeout_ms)?;
                    session.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Session ended with error: {}", e);
                }
            });

        if let Err(e) = spawned {
            tracing::warn!("Failed to spawn session thread: {}", e);
        }
    }
}
