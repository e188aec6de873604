//! Command definitions
//!
//! Represents requests from clients.

use crate::tuple::{Pattern, Tuple};

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Out = 0x01,
    Rd = 0x02,
    In = 0x03,
    Ping = 0x04,
}

impl CommandType {
    /// Map a wire byte back to a command type
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandType::Out),
            0x02 => Some(CommandType::Rd),
            0x03 => Some(CommandType::In),
            0x04 => Some(CommandType::Ping),
            _ => None,
        }
    }

    /// Linda operation name
    pub fn name(&self) -> &'static str {
        match self {
            CommandType::Out => "out",
            CommandType::Rd => "rd",
            CommandType::In => "in",
            CommandType::Ping => "ping",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Insert a tuple
    Out { tuple: Tuple },

    /// Blocking read of a matching tuple
    Rd { pattern: Pattern },

    /// Blocking removal of a matching tuple
    In { pattern: Pattern },

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Out { .. } => CommandType::Out,
            Command::Rd { .. } => CommandType::Rd,
            Command::In { .. } => CommandType::In,
            Command::Ping => CommandType::Ping,
        }
    }

    /// Whether executing this command may block
    pub fn is_blocking(&self) -> bool {
        matches!(self, Command::Rd { .. } | Command::In { .. })
    }
}
