//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: OUT   - Payload: tuple
//! - 0x02: RD    - Payload: pattern
//! - 0x03: IN    - Payload: pattern
//! - 0x04: PING  - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK    (payload: tuple for RD/IN, empty for OUT, "PONG" for PING)
//! - 0x01: ERROR (payload: UTF-8 error description)

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status, PONG};
pub use codec::{
    encode_command, decode_command, encode_response, decode_response,
    encode_tuple, decode_tuple, encode_pattern, decode_pattern,
    read_frame, write_frame, read_command, write_command, read_response, write_response,
    HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
