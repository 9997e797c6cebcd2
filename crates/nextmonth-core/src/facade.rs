//! Session Façade
//!
//! Client-side view of one terminal session: connection state, scrollback
//! and the input line. Pure state, no I/O; a front end feeds it transport
//! events and sends whatever [`TerminalView::submit`] returns.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::SessionId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Connection state of a terminal view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No session requested yet
    #[default]
    Disconnected,
    /// Session requested, transport not open yet
    Connecting,
    /// Transport open; input enabled
    Connected,
    /// The shell exited or the transport closed
    Closed,
    /// A connection-level error occurred
    Errored,
}

/// Kind of scrollback line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Text produced by the shell
    Output,
    /// Echo of a submitted command
    Input,
    /// Status line generated locally
    System,
}

/// One entry in the scrollback log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrollbackLine {
    /// Line kind
    pub kind: LineKind,
    /// Text as received or echoed
    pub text: String,
    /// When the line was appended
    pub timestamp: DateTime<Utc>,
}

/// Terminal view state machine
#[derive(Debug, Default)]
pub struct TerminalView {
    state: ConnectionState,
    session_id: Option<SessionId>,
    scrollback: Vec<ScrollbackLine>,
}

impl TerminalView {
    /// Create a disconnected view
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session request. Discards the previous session's
    /// scrollback and identifier.
    pub fn begin_session(&mut self) {
        self.scrollback.clear();
        self.session_id = None;
        self.state = ConnectionState::Connecting;
    }

    /// The server issued a session token
    pub fn session_allocated(&mut self, session_id: SessionId) {
        self.session_id = Some(session_id);
    }

    /// The transport connection opened
    pub fn transport_opened(&mut self) {
        if self.state != ConnectionState::Connecting {
            return;
        }
        self.state = ConnectionState::Connected;
        self.push(LineKind::System, "Terminal connected");
    }

    /// Apply a raw transport frame. Undecodable frames are ignored.
    pub fn handle_frame(&mut self, text: &str) {
        match ServerMessage::decode(text) {
            Ok(message) => self.handle_message(message),
            Err(e) => debug!(error = %e, "Ignoring undecodable server frame"),
        }
    }

    /// Apply a decoded server message
    pub fn handle_message(&mut self, message: ServerMessage) {
        if self.state != ConnectionState::Connected {
            return;
        }
        match message {
            ServerMessage::Output { data } => self.push(LineKind::Output, data),
            ServerMessage::Exit { code } => {
                self.push(LineKind::System, format!("Process exited with code {code}"));
                self.state = ConnectionState::Closed;
            }
        }
    }

    /// Submit an input line. Returns the message to send, or `None` when the
    /// line is blank or input is disabled.
    pub fn submit(&mut self, line: &str) -> Option<ClientMessage> {
        if !self.input_enabled() || line.trim().is_empty() {
            return None;
        }
        self.push(LineKind::Input, format!("$ {line}"));
        Some(ClientMessage::input(format!("{line}\n")))
    }

    /// Clear the scrollback locally
    pub fn clear(&mut self) {
        self.scrollback.clear();
    }

    /// The transport closed
    pub fn transport_closed(&mut self) {
        if matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            self.push(LineKind::System, "Terminal disconnected");
            self.state = ConnectionState::Closed;
        }
    }

    /// A connection-level error occurred. Input stays disabled until a new
    /// session is started.
    pub fn transport_error(&mut self, reason: impl AsRef<str>) {
        self.push(
            LineKind::System,
            format!("Connection error: {}", reason.as_ref()),
        );
        self.state = ConnectionState::Errored;
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the input line accepts submissions
    pub fn input_enabled(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Scrollback, oldest first
    pub fn scrollback(&self) -> &[ScrollbackLine] {
        &self.scrollback
    }

    /// Current session token, if one was issued
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    fn push(&mut self, kind: LineKind, text: impl Into<String>) {
        self.scrollback.push(ScrollbackLine {
            kind,
            text: text.into(),
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests;
