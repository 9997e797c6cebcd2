//! NextMonth Core - Terminal Session Engine
//!
//! This crate provides the interactive terminal subsystem of the NextMonth
//! workspace server:
//! - Process: shell launcher with piped stdio and exit notification
//! - Registry: process-wide session map with lazy spawn and idempotent teardown
//! - Bridge: per-connection relay between a shell and a message transport
//! - Protocol: JSON wire messages exchanged with the browser
//! - Facade: client-side terminal state machine and scrollback
//! - Audit: seam for recording session lifecycle in an external store

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod bridge;
pub mod error;
pub mod facade;
pub mod process;
pub mod protocol;
pub mod registry;
pub mod session;

pub use audit::{NoopAuditStore, SessionAuditStore};
pub use bridge::{BridgeOutcome, RelayStats, Termination, TransportBridge};
pub use error::{Error, Result};
pub use facade::{ConnectionState, LineKind, ScrollbackLine, TerminalView};
pub use process::{
    OutputEvent, OutputKind, OutputStream, ProcessHandle, ProcessKiller, ShellConfig,
    ShellLauncher, StdinWriter,
};
pub use protocol::{ClientMessage, InputCommand, ServerMessage, SPAWN_FAILURE_EXIT_CODE};
pub use registry::{Attachment, RegistryConfig, SessionRegistry};
pub use session::{ProjectId, SessionId, SessionSummary};
