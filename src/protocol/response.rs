//! Response definitions
//!
//! Represents responses to clients.

use crate::error::{Result, SpaceError};
use crate::tuple::Tuple;

use super::codec::{decode_tuple, encode_tuple};

/// Payload of a successful PING
pub const PONG: &[u8] = b"PONG";

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x01,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (encoded tuple for RD/IN, message for ERROR)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an OK response carrying a tuple
    pub fn with_tuple(tuple: &Tuple) -> Result<Self> {
        Ok(Self::ok(Some(encode_tuple(tuple)?)))
    }

    /// Create the PING reply
    pub fn pong() -> Self {
        Self::ok(Some(PONG.to_vec()))
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Interpret the response as the result of an RD/IN
    pub fn into_tuple(self) -> Result<Tuple> {
        match (self.status, self.payload) {
            (Status::Ok, Some(bytes)) => decode_tuple(&bytes),
            (Status::Ok, None) => Err(SpaceError::Protocol(
                "OK response is missing its tuple".to_string(),
            )),
            (Status::Error, payload) => Err(Self::remote_error(payload)),
        }
    }

    /// Interpret the response as the result of an OUT/PING
    pub fn into_unit(self) -> Result<()> {
        match self.status {
            Status::Ok => Ok(()),
            Status::Error => Err(Self::remote_error(self.payload)),
        }
    }

    fn remote_error(payload: Option<Vec<u8>>) -> SpaceError {
        let message = payload
            .map(|p| String::from_utf8_lossy(&p).into_owned())
            .unwrap_or_default();
        SpaceError::Remote(message)
    }
}
