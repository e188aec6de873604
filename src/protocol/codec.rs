//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - OUT:  bincode(Vec<Value>)
//! - RD:   bincode(Vec<PatternField>)
//! - IN:   bincode(Vec<PatternField>)
//! - PING: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{Result, SpaceError};
use crate::tuple::{Pattern, PatternField, Tuple, Value};

use super::{Command, CommandType, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Tuple / Pattern Payloads
// =============================================================================

/// Encode a tuple's values as a bincode payload
pub fn encode_tuple(tuple: &Tuple) -> Result<Vec<u8>> {
    bincode::serialize(tuple.fields()).map_err(|e| SpaceError::Serialization(e.to_string()))
}

/// Decode a tuple payload; an empty value list fails validation
pub fn decode_tuple(payload: &[u8]) -> Result<Tuple> {
    let fields: Vec<Value> = bincode::deserialize(payload)
        .map_err(|e| SpaceError::Protocol(format!("undecodable tuple: {}", e)))?;
    Tuple::new(fields)
}

/// Encode a pattern's fields as a bincode payload
pub fn encode_pattern(pattern: &Pattern) -> Result<Vec<u8>> {
    bincode::serialize(pattern.fields()).map_err(|e| SpaceError::Serialization(e.to_string()))
}

/// Decode a pattern payload; an empty field list fails validation
pub fn decode_pattern(payload: &[u8]) -> Result<Pattern> {
    let fields: Vec<PatternField> = bincode::deserialize(payload)
        .map_err(|e| SpaceError::Protocol(format!("undecodable pattern: {}", e)))?;
    Pattern::new(fields)
}

// =============================================================================
// Framing
// =============================================================================

/// Build a frame: type/status byte + payload_len (4) + payload
fn encode_frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(kind);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.to_vec()
}

/// Split a complete frame into its type/status byte and payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(SpaceError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let kind = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(SpaceError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(SpaceError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let payload = match command {
        Command::Out { tuple } => encode_tuple(tuple)?,
        Command::Rd { pattern } | Command::In { pattern } => encode_pattern(pattern)?,
        Command::Ping => Vec::new(),
    };

    Ok(encode_frame(command.command_type() as u8, &payload))
}

/// Decode a command from a complete frame
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_byte, payload) = split_frame(bytes, "command")?;

    let cmd_type = CommandType::from_byte(cmd_byte).ok_or_else(|| {
        SpaceError::Protocol(format!("Unknown command type: 0x{:02x}", cmd_byte))
    })?;

    match cmd_type {
        CommandType::Out => Ok(Command::Out {
            tuple: decode_tuple(payload)?,
        }),
        CommandType::Rd => Ok(Command::Rd {
            pattern: decode_pattern(payload)?,
        }),
        CommandType::In => Ok(Command::In {
            pattern: decode_pattern(payload)?,
        }),
        CommandType::Ping => {
            if !payload.is_empty() {
                return Err(SpaceError::Protocol(format!(
                    "PING command: unexpected payload of {} bytes",
                    payload.len()
                )));
            }
            Ok(Command::Ping)
        }
    }
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Vec<u8> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    encode_frame(response.status as u8, payload)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::Error,
        _ => {
            return Err(SpaceError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header + payload) from a stream
///
/// Blocks until the whole frame arrived. Only I/O failures and an
/// oversized length header fail here; a frame that was read completely
/// can always be answered and the stream stays in sync.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(SpaceError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = vec![0u8; HEADER_SIZE + payload_len];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut frame[HEADER_SIZE..])?;
    }

    Ok(frame)
}

/// Write one frame (type/status byte + length + payload) and flush
pub fn write_frame<W: Write>(writer: &mut W, kind: u8, payload: &[u8]) -> Result<()> {
    writer.write_all(&encode_frame(kind, payload))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete command from a stream
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let frame = read_frame(reader)?;
    decode_command(&frame)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader)?;
    decode_response(&frame)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
