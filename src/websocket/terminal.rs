//! Terminal WebSocket handler
//!
//! Adapts an axum WebSocket into the transport bridge. Server messages go out
//! as text frames; text (and lossily decoded binary) frames come in as client
//! messages. Ping/pong is answered by the socket itself.

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Extension, Query,
    },
    response::IntoResponse,
};
use futures::{future, stream::SplitSink, SinkExt, StreamExt};
use nextmonth_core::{ProjectId, SessionId, Termination, TransportBridge};
use serde::Deserialize;
use std::borrow::Cow;
use tracing::{debug, info, warn};

/// Close reason for connections without usable query parameters
pub const MISSING_PARAMS_REASON: &str = "Missing sessionId or projectId";

/// Query parameters of `/ws`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalParams {
    pub session_id: Option<String>,
    pub project_id: Option<String>,
}

impl TerminalParams {
    /// Both parameters present and the project id numeric
    pub fn parse(&self) -> Option<(SessionId, ProjectId)> {
        let session_id = self.session_id.as_deref().filter(|s| !s.is_empty())?;
        let project_id = self.project_id.as_deref()?.trim().parse().ok()?;
        Some((SessionId::from(session_id), project_id))
    }
}

/// WebSocket upgrade handler
pub async fn terminal_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<TerminalParams>,
    Extension(bridge): Extension<TransportBridge>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, params, bridge))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, params: TerminalParams, bridge: TransportBridge) {
    let (sender, receiver) = socket.split();

    let Some((session_id, project_id)) = params.parse() else {
        debug!(?params, "Rejecting terminal connection without parameters");
        close_with(sender, close_code::POLICY, MISSING_PARAMS_REASON).await;
        return;
    };

    info!(session_id = %session_id, project_id, "Terminal connection established");

    let mut outbound =
        sender.with(|text: String| future::ready(Ok::<_, axum::Error>(Message::Text(text))));

    let inbound = receiver
        .take_while(|msg| future::ready(matches!(msg, Ok(m) if !matches!(m, Message::Close(_)))))
        .filter_map(|msg| {
            future::ready(match msg {
                Ok(Message::Text(text)) => Some(text),
                Ok(Message::Binary(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                _ => None,
            })
        });

    match bridge
        .run_attach(&session_id, project_id, &mut outbound, inbound)
        .await
    {
        Ok(outcome) => match outcome.termination {
            Termination::ProcessExited(code) => info!(
                session_id = %session_id,
                code,
                output = outcome.stats.output_messages,
                input = outcome.stats.input_messages,
                "Terminal connection finished after process exit"
            ),
            Termination::TransportClosed => info!(
                session_id = %session_id,
                output = outcome.stats.output_messages,
                input = outcome.stats.input_messages,
                "Terminal connection closed by client"
            ),
        },
        Err(e) => {
            let code = if e.is_attach_refusal() {
                close_code::POLICY
            } else {
                close_code::ERROR
            };
            warn!(session_id = %session_id, "Terminal connection refused: {}", e);
            close_with(outbound.into_inner(), code, &e.to_string()).await;
        }
    }
}

/// Send a close frame with `reason` and shut the socket
async fn close_with(mut sender: SplitSink<WebSocket, Message>, code: u16, reason: &str) {
    let frame = CloseFrame {
        code,
        reason: Cow::Owned(close_reason(reason)),
    };
    if let Err(e) = sender.send(Message::Close(Some(frame))).await {
        debug!("Failed to send close frame: {}", e);
    }
    let _ = sender.close().await;
}

/// Close reasons must fit a control frame (123 bytes)
fn close_reason(reason: &str) -> String {
    const MAX: usize = 123;
    if reason.len() <= MAX {
        return reason.to_string();
    }
    let mut end = MAX;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    reason[..end].to_string()
}
