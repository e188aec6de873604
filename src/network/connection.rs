//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufRead, BufReader, BufWriter, Cursor, ErrorKind, Read};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::Config;
use crate::error::{Result, SpaceError};
use crate::protocol::{
    decode_command, read_frame, write_response, Command, Response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use crate::space::{CancelToken, TupleSpace};
use crate::tuple::Tuple;

/// Most bytes a disconnect watcher buffers past a blocked request
const READ_AHEAD_LIMIT: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE as usize;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Handle to the shared tuple space
    space: TupleSpace,

    /// Peer address for logging
    peer_addr: String,

    /// Read timeout between requests (restored after each blocking request)
    read_timeout: Option<Duration>,

    /// How often a blocked request checks for a client hang-up
    disconnect_poll: Duration,

    /// Request bytes read off the socket while a request was blocked,
    /// served before anything left in `reader`
    pending: Vec<u8>,

    /// The client closed its end; queued requests may still be answered
    peer_closed: bool,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and configures timeouts
    pub fn new(stream: TcpStream, space: TupleSpace, config: &Config) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        let mut connection = Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            space,
            peer_addr,
            read_timeout: None,
            disconnect_poll: Duration::from_millis(config.disconnect_poll_ms.max(1)),
            pending: Vec::new(),
            peer_closed: false,
        };
        connection.set_timeouts(config.read_timeout_ms, config.write_timeout_ms)?;

        Ok(connection)
    }

    /// Configure connection timeouts (0 leaves the timeout unset)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        self.read_timeout = (read_ms > 0).then(|| Duration::from_millis(read_ms));

        self.reader.get_ref().set_read_timeout(self.read_timeout)?;
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            // Read next frame; only I/O problems end up here
            let frame = match self.next_frame() {
                Ok(frame) => frame,
                Err(SpaceError::Io(ref e)) if Self::is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected ({:?})", self.peer_addr, e.kind());
                    return Ok(());
                }
                Err(SpaceError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Stream is out of sync now; report and close
                    let _ = self.send_response(Response::error(&e.to_string()));
                    return Err(e);
                }
            };

            // A bad frame was fully consumed, so the connection stays usable
            let response = match decode_command(&frame) {
                Ok(command) => {
                    tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);
                    self.execute_command(command)
                }
                Err(e) => {
                    tracing::debug!("Rejected request from {}: {}", self.peer_addr, e);
                    Response::error(&e.to_string())
                }
            };

            if let Err(e) = self.send_response(response) {
                // The client may have hung up while its request was blocked
                if let SpaceError::Io(ref io_err) = e {
                    if Self::is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }

            if self.space.is_closed() {
                tracing::debug!("Tuple space closed, dropping client {}", self.peer_addr);
                return Ok(());
            }
        }
    }

    /// Execute a command and return a response
    fn execute_command(&mut self, command: Command) -> Response {
        if let Command::Ping = command {
            return Response::pong();
        }

        let result = if command.is_blocking() {
            self.execute_blocking(command)
        } else {
            self.space.execute(command, &self.space.cancel_token())
        };

        match result {
            Ok(Some(tuple)) => {
                Response::with_tuple(&tuple).unwrap_or_else(|e| Response::error(&e.to_string()))
            }
            Ok(None) => Response::ok(None),
            Err(e) => Response::error(&e.to_string()),
        }
    }

    /// Run a blocking `rd`/`in` while watching for the client to hang up
    ///
    /// A scoped watcher thread reads ahead on the socket. EOF or a socket
    /// error cancels the request so its waiter does not outlive the client.
    /// Pipelined bytes it picks up are queued for the request loop.
    fn execute_blocking(&mut self, command: Command) -> Result<Option<Tuple>> {
        if self.peer_closed {
            tracing::debug!("Dropping queued {:?} from departed client {}", command, self.peer_addr);
            return Err(SpaceError::Cancelled);
        }

        // The watcher reads the socket directly, so whatever the BufReader
        // already pulled in has to be queued ahead of it
        let buffered = self.reader.buffer().len();
        self.pending.extend_from_slice(self.reader.buffer());
        self.reader.consume(buffered);

        let token = self.space.cancel_token();
        let socket = self.reader.get_ref().try_clone()?;
        socket.set_read_timeout(Some(self.disconnect_poll))?;

        let done = AtomicBool::new(false);
        let space = &self.space;
        let watch = Watch {
            socket: &socket,
            token: &token,
            done: &done,
            peer_addr: self.peer_addr.as_str(),
            limit: READ_AHEAD_LIMIT.saturating_sub(self.pending.len()),
        };

        let (result, read_ahead) = crossbeam::scope(|s| {
            let watcher = s.spawn(move |_| watch.run());

            let result = space.execute(command, &token);
            done.store(true, Ordering::SeqCst);
            (result, watcher.join())
        })
        .map_err(|_| SpaceError::Network("disconnect watcher panicked".to_string()))?;

        let read_ahead = read_ahead
            .map_err(|_| SpaceError::Network("disconnect watcher panicked".to_string()))?;
        self.pending.extend_from_slice(&read_ahead.bytes);
        self.peer_closed |= read_ahead.hung_up;

        // Socket options are shared between clones; put the idle timeout back
        self.reader.get_ref().set_read_timeout(self.read_timeout)?;

        result
    }

    /// Next request frame, taking queued bytes before the socket
    fn next_frame(&mut self) -> Result<Vec<u8>> {
        if self.pending.is_empty() {
            return read_frame(&mut self.reader);
        }

        let mut source = Cursor::new(std::mem::take(&mut self.pending)).chain(&mut self.reader);
        let frame = read_frame(&mut source);

        let (queued, _) = source.into_inner();
        let consumed = queued.position() as usize;
        let mut rest = queued.into_inner();
        rest.drain(..consumed.min(rest.len()));
        self.pending = rest;

        frame
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)?;
        Ok(())
    }

    fn is_disconnect(kind: ErrorKind) -> bool {
        matches!(
            kind,
            ErrorKind::UnexpectedEof
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::BrokenPipe
        )
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// What a disconnect watcher saw while its request was blocked
#[derive(Debug, Default)]
struct ReadAhead {
    /// Bytes of later requests, in arrival order
    bytes: Vec<u8>,

    /// EOF or a socket error was seen
    hung_up: bool,
}

/// Everything a disconnect watcher borrows from its connection
struct Watch<'a> {
    socket: &'a TcpStream,
    token: &'a CancelToken,
    done: &'a AtomicBool,
    peer_addr: &'a str,
    limit: usize,
}

impl Watch<'_> {
    /// Read the socket until the request finishes or the client goes away
    fn run(self) -> ReadAhead {
        let mut ahead = ReadAhead::default();
        let mut chunk = [0u8; 4096];
        let mut socket = self.socket;

        while !self.done.load(Ordering::SeqCst) {
            let room = self.limit.saturating_sub(ahead.bytes.len());
            if room == 0 {
                tracing::warn!(
                    "Client {} queued more than {} bytes behind a blocking request",
                    self.peer_addr,
                    self.limit
                );
                break;
            }

            let want = room.min(chunk.len());
            match socket.read(&mut chunk[..want]) {
                Ok(0) => {
                    tracing::debug!("Client {} hung up during a blocking request", self.peer_addr);
                    ahead.hung_up = true;
                    self.token.cancel();
                    break;
                }
                Ok(n) => ahead.bytes.extend_from_slice(&chunk[..n]),
                Err(ref e)
                    if matches!(
                        e.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) => {}
                Err(e) => {
                    tracing::debug!(
                        "Watching {} failed ({}), cancelling its request",
                        self.peer_addr,
                        e
                    );
                    ahead.hung_up = true;
                    self.token.cancel();
                    break;
                }
            }
        }

        ahead
    }
}
