//! Transport Bridge
//!
//! Relays one attached session between its shell and a message transport.
//! The bridge is transport-agnostic: anything that is a `Sink<String>` for
//! outbound frames and a `Stream<Item = String>` for inbound frames works.
//!
//! Two directions run concurrently and the first to finish decides the
//! outcome. Either way the session is removed from the registry before
//! the bridge returns, so no shell outlives its connection.
//!
//! Inbound frames never wait on the shell: they are queued for a writer task
//! that owns stdin, so the transport keeps being polled (and its close
//! noticed) while the shell is not reading. Frames arriving while the queue is
//! full are dropped.

use crate::error::{Error, Result};
use crate::process::{OutputKind, OutputStream, StdinWriter};
use crate::protocol::{ClientMessage, InputCommand, ServerMessage, SPAWN_FAILURE_EXIT_CODE};
use crate::registry::{Attachment, SessionRegistry};
use crate::session::{ProjectId, SessionId};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

/// Input frames queued for the shell before new ones are dropped
const INPUT_QUEUE_DEPTH: usize = 1024;

/// Why a bridge stopped relaying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The shell exited with this code and the transport was closed
    ProcessExited(i32),
    /// The transport went away first and the shell was killed
    TransportClosed,
}

/// Message counters for one bridge run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Frames sent to the transport (output and exit)
    pub output_messages: u64,
    /// Input frames written to the shell
    pub input_messages: u64,
    /// Inbound frames discarded as malformed, unwritable or over the queue limit
    pub dropped_messages: u64,
}

/// Result of a finished bridge run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOutcome {
    /// Session that was relayed
    pub session_id: SessionId,
    /// How the relay ended
    pub termination: Termination,
    /// Message counters
    pub stats: RelayStats,
}

/// Transport Bridge
#[derive(Clone)]
pub struct TransportBridge {
    registry: Arc<SessionRegistry>,
}

impl TransportBridge {
    /// Create a bridge over the given registry
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Registry this bridge tears sessions down in
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Attach to a session and relay until either side ends.
    ///
    /// Attach refusals ([`Error::NotFound`], [`Error::AlreadyAttached`]) are
    /// returned without touching `outbound`, leaving the caller to reject the
    /// connection. A shell that fails to start is reported to the client as
    /// an exit with [`SPAWN_FAILURE_EXIT_CODE`].
    pub async fn run_attach<O, I>(
        &self,
        session_id: &SessionId,
        project_id: ProjectId,
        mut outbound: O,
        inbound: I,
    ) -> Result<BridgeOutcome>
    where
        O: Sink<String> + Unpin,
        O::Error: Display,
        I: Stream<Item = String> + Unpin,
    {
        match self.registry.attach(session_id, project_id).await {
            Ok(attachment) => Ok(self.run(attachment, outbound, inbound).await),
            Err(Error::Spawn(reason)) => {
                warn!(session_id = %session_id, %reason, "Reporting spawn failure to client");
                let mut stats = RelayStats::default();
                let exit = ServerMessage::Exit {
                    code: SPAWN_FAILURE_EXIT_CODE,
                };
                if send_message(&mut outbound, &exit).await.is_ok() {
                    stats.output_messages += 1;
                }
                let _ = outbound.close().await;
                Ok(BridgeOutcome {
                    session_id: session_id.clone(),
                    termination: Termination::ProcessExited(SPAWN_FAILURE_EXIT_CODE),
                    stats,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Relay an already attached session until either side ends.
    pub async fn run<O, I>(
        &self,
        attachment: Attachment,
        mut outbound: O,
        mut inbound: I,
    ) -> BridgeOutcome
    where
        O: Sink<String> + Unpin,
        O::Error: Display,
        I: Stream<Item = String> + Unpin,
    {
        let Attachment {
            session_id,
            stdin,
            killer,
            mut output,
            ..
        } = attachment;

        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
        let writer = tokio::spawn(pump_stdin(session_id.clone(), stdin, input_rx));

        let mut stats = RelayStats::default();
        let termination = {
            let outbound_pump = pump_outbound(
                &session_id,
                &mut output,
                &mut outbound,
                &mut stats.output_messages,
            );
            let inbound_pump = pump_inbound(
                &session_id,
                &input_tx,
                &mut inbound,
                &mut stats.dropped_messages,
            );
            tokio::pin!(outbound_pump);
            tokio::pin!(inbound_pump);

            tokio::select! {
                termination = &mut outbound_pump => termination,
                termination = &mut inbound_pump => termination,
            }
        };
        drop(input_tx);

        match termination {
            Termination::ProcessExited(code) => {
                debug!(session_id = %session_id, code, "Shell exited, closing transport");
                let _ = outbound.close().await;
            }
            Termination::TransportClosed => {
                debug!(session_id = %session_id, "Transport closed, killing shell");
                killer.kill();
            }
        }

        self.registry.remove(&session_id).await;

        // The shell is gone, so stdin is closed and the writer only drains
        match writer.await {
            Ok(counts) => {
                stats.input_messages = counts.written;
                stats.dropped_messages += counts.dropped;
            }
            Err(e) => warn!(session_id = %session_id, error = %e, "stdin writer task failed"),
        }

        info!(
            session_id = %session_id,
            termination = ?termination,
            output = stats.output_messages,
            input = stats.input_messages,
            dropped = stats.dropped_messages,
            "Terminal bridge finished"
        );

        BridgeOutcome {
            session_id,
            termination,
            stats,
        }
    }
}

async fn send_message<O>(outbound: &mut O, message: &ServerMessage) -> std::result::Result<(), String>
where
    O: Sink<String> + Unpin,
    O::Error: Display,
{
    let text = message.encode().map_err(|e| e.to_string())?;
    outbound.send(text).await.map_err(|e| e.to_string())
}

/// Shell to transport. Ends after the exit frame, or when the transport
/// stops accepting frames.
async fn pump_outbound<O>(
    session_id: &SessionId,
    output: &mut OutputStream,
    outbound: &mut O,
    sent: &mut u64,
) -> Termination
where
    O: Sink<String> + Unpin,
    O::Error: Display,
{
    loop {
        let message = match output.recv().await {
            Some(event) => match event.kind {
                OutputKind::Output(data) => ServerMessage::output(&data),
                OutputKind::Exit(code) => ServerMessage::Exit { code },
            },
            None => ServerMessage::Exit {
                code: SPAWN_FAILURE_EXIT_CODE,
            },
        };

        let exit_code = match &message {
            ServerMessage::Exit { code } => Some(*code),
            ServerMessage::Output { .. } => None,
        };

        if let Err(e) = send_message(outbound, &message).await {
            debug!(session_id = %session_id, error = %e, "Transport rejected frame");
            return Termination::TransportClosed;
        }
        *sent += 1;

        if let Some(code) = exit_code {
            return Termination::ProcessExited(code);
        }
    }
}

/// Transport to queue. Ends when the transport ends; never waits on the shell.
async fn pump_inbound<I>(
    session_id: &SessionId,
    queue: &mpsc::Sender<Vec<u8>>,
    inbound: &mut I,
    dropped: &mut u64,
) -> Termination
where
    I: Stream<Item = String> + Unpin,
{
    while let Some(text) = inbound.next().await {
        let command = match ClientMessage::decode(&text) {
            Ok(message) => InputCommand::from(message),
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Dropping malformed client message");
                *dropped += 1;
                continue;
            }
        };

        match queue.try_send(command.data) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                debug!(session_id = %session_id, "Input queue full, dropping message");
                *dropped += 1;
            }
            Err(TrySendError::Closed(_)) => *dropped += 1,
        }
    }
    Termination::TransportClosed
}

#[derive(Debug, Default)]
struct StdinCounts {
    written: u64,
    dropped: u64,
}

/// Queue to shell, in arrival order. Ends when the queue is closed and drained.
async fn pump_stdin(
    session_id: SessionId,
    stdin: StdinWriter,
    mut queue: mpsc::Receiver<Vec<u8>>,
) -> StdinCounts {
    let mut counts = StdinCounts::default();
    while let Some(data) = queue.recv().await {
        match stdin.write(&data).await {
            Ok(()) => counts.written += 1,
            Err(Error::BrokenPipe) => {
                debug!(session_id = %session_id, "Input after shell exit dropped");
                counts.dropped += 1;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Failed to write to shell");
                counts.dropped += 1;
            }
        }
    }
    counts
}
