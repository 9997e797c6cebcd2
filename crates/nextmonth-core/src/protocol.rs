//! Terminal WebSocket protocol definitions
//!
//! One JSON object per transport message, tagged by `type`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Exit code reported when the shell could not be started
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// Message from client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bytes for the shell's stdin, verbatim
    Input {
        /// Text to write (include the newline to submit a command)
        data: String,
    },
}

impl ClientMessage {
    /// Build an input message
    pub fn input(data: impl Into<String>) -> Self {
        Self::Input { data: data.into() }
    }

    /// Decode a transport text frame
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::MalformedMessage(e.to_string()))
    }

    /// Encode as a transport text frame
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Message to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Shell output decoded as text
    Output {
        /// Output text
        data: String,
    },
    /// The shell terminated; nothing follows for this session
    Exit {
        /// Process exit code
        code: i32,
    },
}

impl ServerMessage {
    /// Build an output message from raw bytes (invalid UTF-8 is replaced)
    #[must_use]
    pub fn output(bytes: &[u8]) -> Self {
        Self::Output {
            data: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Decode a transport text frame
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::MalformedMessage(e.to_string()))
    }

    /// Encode as a transport text frame
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// User input destined for a shell's stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputCommand {
    /// Raw bytes
    pub data: Vec<u8>,
}

impl From<ClientMessage> for InputCommand {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Input { data } => Self {
                data: data.into_bytes(),
            },
        }
    }
}

#[cfg(test)]
mod tests;
