//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::collections::HashMap;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{Result, SpaceError};
use crate::protocol::{write_response, Response};
use crate::space::TupleSpace;

use super::Connection;

/// Streams of live connections, kept so shutdown can unblock their reads
type ConnectionRegistry = Arc<Mutex<HashMap<u64, TcpStream>>>;

/// Cloneable handle that stops a running server
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the accept loop to stop; `run` returns shortly after
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server for a tuple space
pub struct Server {
    config: Config,
    space: TupleSpace,
    listener: TcpListener,
    shutdown: ShutdownHandle,
    active: Arc<AtomicUsize>,
    connections: ConnectionRegistry,
    next_id: AtomicU64,
}

impl Server {
    /// Validate config and bind the listen address
    pub fn bind(config: Config, space: TupleSpace) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            SpaceError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        // Non-blocking accept so the loop can notice shutdown
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            space,
            listener,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
            active: Arc::new(AtomicUsize::new(0)),
            connections: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// The tuple space this server serves
    pub fn space(&self) -> &TupleSpace {
        &self.space
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Start the server (blocking until shutdown)
    ///
    /// On shutdown:
    /// 1. Stop accepting
    /// 2. Close the tuple space (blocked requests get `Closed`)
    /// 3. Shut down the read side of every live socket (idle reads see EOF,
    ///    pending responses can still be written)
    /// 4. Join the connection threads
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        let poll = Duration::from_millis(self.config.accept_poll_ms);
        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    match self.dispatch(stream, addr) {
                        Ok(Some(handle)) => workers.push(handle),
                        Ok(None) => {}
                        // Only this client is lost; keep serving the rest
                        Err(e) => tracing::warn!("Failed to start connection {}: {}", addr, e),
                    }
                    workers.retain(|w| !w.is_finished());
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(poll);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(poll);
                }
            }
        }

        tracing::info!("Shutting down, {} connection(s) open", self.active_connections());
        self.space.close();

        for (_, stream) in self.connections.lock().drain() {
            let _ = stream.shutdown(Shutdown::Read);
        }
        for worker in workers {
            let _ = worker.join();
        }

        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Hand an accepted stream to a connection thread, or turn it away
    fn dispatch(&self, stream: TcpStream, addr: SocketAddr) -> Result<Option<JoinHandle<()>>> {
        // Accepted sockets may inherit non-blocking mode from the listener
        stream.set_nonblocking(false)?;

        if self.active.load(Ordering::SeqCst) >= self.config.max_connections {
            tracing::warn!(
                "Rejecting {}: connection limit {} reached",
                addr,
                self.config.max_connections
            );
            let mut stream = stream;
            let _ = write_response(&mut stream, &Response::error("too many connections"));
            return Ok(None);
        }

        let slot = ConnectionSlot::register(
            self.next_id.fetch_add(1, Ordering::Relaxed),
            stream.try_clone()?,
            &self.connections,
            &self.active,
        );

        let space = self.space.clone();
        let config = self.config.clone();

        // If the spawn fails the closure is dropped, and the slot with it
        let handle = thread::Builder::new()
            .name(format!("conn-{}", slot.id))
            .spawn(move || {
                let _slot = slot;
                match Connection::new(stream, space, &config) {
                    Ok(mut connection) => {
                        if let Err(e) = connection.handle() {
                            tracing::debug!("Connection {} ended with error: {}", addr, e);
                        }
                    }
                    Err(e) => tracing::warn!("Failed to set up connection {}: {}", addr, e),
                }
            })?;

        Ok(Some(handle))
    }
}

/// A live connection's registry entry and its share of the active count
///
/// Both are released on drop, whether the worker finished or never started.
struct ConnectionSlot {
    id: u64,
    connections: ConnectionRegistry,
    active: Arc<AtomicUsize>,
}

impl ConnectionSlot {
    fn register(
        id: u64,
        stream: TcpStream,
        connections: &ConnectionRegistry,
        active: &Arc<AtomicUsize>,
    ) -> Self {
        connections.lock().insert(id, stream);
        active.fetch_add(1, Ordering::SeqCst);

        Self {
            id,
            connections: Arc::clone(connections),
            active: Arc::clone(active),
        }
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.connections.lock().remove(&self.id);
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
