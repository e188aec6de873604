//! Blocking client
//!
//! One request in flight at a time, matching the server's per-connection
//! request/response loop.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{Result, SpaceError};
use crate::protocol::{
    encode_pattern, encode_tuple, read_response, write_command, write_frame, Command,
    CommandType, Response, PONG,
};
use crate::tuple::{Pattern, Tuple};

/// Client connection to a lindaspace server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| SpaceError::Network(format!("unable to connect: {}", e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    /// Insert a tuple
    pub fn out(&mut self, tuple: &Tuple) -> Result<()> {
        let payload = encode_tuple(tuple)?;
        self.request(CommandType::Out, &payload)?.into_unit()
    }

    /// Blocking read; returns once the server found a match
    pub fn rd(&mut self, pattern: &Pattern) -> Result<Tuple> {
        let payload = encode_pattern(pattern)?;
        self.request(CommandType::Rd, &payload)?.into_tuple()
    }

    /// Blocking take; returns once the server removed a match
    pub fn in_(&mut self, pattern: &Pattern) -> Result<Tuple> {
        let payload = encode_pattern(pattern)?;
        self.request(CommandType::In, &payload)?.into_tuple()
    }

    /// Health check
    pub fn ping(&mut self) -> Result<()> {
        let response = self.send(&Command::Ping)?;
        if !response.is_ok() {
            return response.into_unit();
        }
        if response.payload.as_deref() == Some(PONG) {
            Ok(())
        } else {
            Err(SpaceError::Protocol("unexpected PING reply".to_string()))
        }
    }

    /// Send one command and wait for its response
    pub fn send(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        read_response(&mut self.reader)
    }

    /// Frame an already-encoded payload and wait for the response
    fn request(&mut self, kind: CommandType, payload: &[u8]) -> Result<Response> {
        write_frame(&mut self.writer, kind as u8, payload)?;
        read_response(&mut self.reader)
    }

    /// Send raw bytes (for exercising the server's error handling)
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<Response> {
        use std::io::Write;

        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        read_response(&mut self.reader)
    }
}
