//! Line-oriented terminal client
//!
//! Requests a session over HTTP, attaches over WebSocket and drives a
//! [`TerminalView`] from stdin. Lines starting with `:` are local commands.

use anyhow::{Context, Result};
use clap::Args;
use futures::{SinkExt, StreamExt};
use nextmonth_core::{LineKind, ProjectId, SessionId, TerminalView};
use reqwest::Url;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::debug;

use crate::api::terminal::CreateSessionResponse;

/// Arguments of `nextmonth terminal`
#[derive(Args, Debug)]
pub struct TerminalArgs {
    /// Server base URL
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    pub server: String,
    /// Project the shell belongs to
    #[arg(long)]
    pub project_id: ProjectId,
}

/// Local commands typed at the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    /// Clear the scrollback
    Clear,
    /// Discard this session and start a new one
    New,
    /// Leave the client
    Quit,
}

impl LocalCommand {
    /// Parse a prompt line; `None` means the line goes to the shell
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            ":clear" => Some(Self::Clear),
            ":new" => Some(Self::New),
            ":quit" | ":q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// WebSocket URL for attaching to `session_id`
pub fn ws_url(server: &str, session_id: &SessionId, project_id: ProjectId) -> Result<String> {
    let mut url = Url::parse(server).with_context(|| format!("Invalid server URL: {server}"))?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|()| anyhow::anyhow!("Cannot use {server} as a WebSocket URL"))?;
    url.set_path("/ws");
    url.query_pairs_mut()
        .clear()
        .append_pair("sessionId", session_id.as_str())
        .append_pair("projectId", &project_id.to_string());
    Ok(url.to_string())
}

/// Prints scrollback lines not yet shown
#[derive(Debug, Default)]
struct Renderer {
    printed: usize,
}

impl Renderer {
    fn render(&mut self, view: &TerminalView) {
        self.render_to(view, &mut std::io::stdout().lock());
    }

    fn render_to<W: Write>(&mut self, view: &TerminalView, out: &mut W) {
        let lines = view.scrollback();
        if lines.len() < self.printed {
            self.printed = 0;
        }

        for line in &lines[self.printed..] {
            let _ = match line.kind {
                LineKind::Output => write!(out, "{}", line.text),
                // Already visible where the user typed it
                LineKind::Input => Ok(()),
                LineKind::System => writeln!(out, "[{}]", line.text),
            };
        }
        let _ = out.flush();
        self.printed = lines.len();
    }

    fn reset(&mut self) {
        self.printed = 0;
    }

    /// Clear the view; the next render starts from the top of the scrollback
    fn clear(&mut self, view: &mut TerminalView) {
        view.clear();
        self.reset();
    }
}

enum SessionEnd {
    New,
    Quit,
}

/// Run the interactive client
pub async fn run(args: TerminalArgs) -> Result<()> {
    let http = reqwest::Client::new();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut view = TerminalView::new();
    let mut renderer = Renderer::default();

    println!("Type :clear, :new or :quit. Other lines are sent to the shell.");

    loop {
        view.begin_session();
        renderer.reset();

        let end = match request_session(&http, &args).await {
            Ok(session_id) => {
                view.session_allocated(session_id.clone());
                drive_session(&args, &session_id, &mut view, &mut renderer, &mut stdin).await?
            }
            Err(e) => {
                view.transport_error(format!("{e:#}"));
                renderer.render(&view);
                wait_for_command(&mut view, &mut renderer, &mut stdin).await?
            }
        };

        if let SessionEnd::Quit = end {
            return Ok(());
        }
    }
}

async fn request_session(http: &reqwest::Client, args: &TerminalArgs) -> Result<SessionId> {
    let url = format!("{}/api/terminal/session", args.server.trim_end_matches('/'));
    let response: CreateSessionResponse = http
        .post(&url)
        .json(&serde_json::json!({ "projectId": args.project_id }))
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?
        .error_for_status()?
        .json()
        .await
        .context("Invalid session response")?;
    Ok(SessionId::from(response.session_id))
}

async fn drive_session<R>(
    args: &TerminalArgs,
    session_id: &SessionId,
    view: &mut TerminalView,
    renderer: &mut Renderer,
    stdin: &mut tokio::io::Lines<R>,
) -> Result<SessionEnd>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let url = ws_url(&args.server, session_id, args.project_id)?;
    let socket = match connect_async(url.as_str()).await {
        Ok((socket, _)) => socket,
        Err(e) => {
            view.transport_error(e.to_string());
            renderer.render(view);
            return wait_for_command(view, renderer, stdin).await;
        }
    };

    view.transport_opened();
    let (mut write, mut read) = socket.split();
    let mut open = true;

    loop {
        renderer.render(view);

        tokio::select! {
            frame = read.next(), if open => match frame {
                Some(Ok(Message::Text(text))) => view.handle_frame(&text),
                Some(Ok(Message::Close(_))) | None => {
                    open = false;
                    view.transport_closed();
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    open = false;
                    view.transport_error(e.to_string());
                }
            },
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    return Ok(SessionEnd::Quit);
                };
                match LocalCommand::parse(&line) {
                    Some(LocalCommand::Quit) => {
                        let _ = write.close().await;
                        return Ok(SessionEnd::Quit);
                    }
                    Some(LocalCommand::New) => {
                        let _ = write.close().await;
                        return Ok(SessionEnd::New);
                    }
                    Some(LocalCommand::Clear) => renderer.clear(view),
                    None => send_line(view, &mut write, &line).await?,
                }
            }
        }
    }
}

async fn send_line<S>(view: &mut TerminalView, write: &mut S, line: &str) -> Result<()>
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    if !view.input_enabled() {
        if !line.trim().is_empty() {
            println!("[Input disabled, type :new for a new session]");
        }
        return Ok(());
    }

    if let Some(message) = view.submit(line) {
        let text = message.encode()?;
        if let Err(e) = write.send(Message::Text(text)).await {
            debug!("Send failed: {}", e);
            view.transport_error(e.to_string());
        }
    }
    Ok(())
}

async fn wait_for_command<R>(
    view: &mut TerminalView,
    renderer: &mut Renderer,
    stdin: &mut tokio::io::Lines<R>,
) -> Result<SessionEnd>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    while let Some(line) = stdin.next_line().await? {
        match LocalCommand::parse(&line) {
            Some(LocalCommand::Quit) => return Ok(SessionEnd::Quit),
            Some(LocalCommand::New) => return Ok(SessionEnd::New),
            Some(LocalCommand::Clear) => {
                renderer.clear(view);
                renderer.render(view);
            }
            None => println!("[Input disabled, type :new for a new session]"),
        }
    }
    Ok(SessionEnd::Quit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use nextmonth_core::{ConnectionState, ServerMessage};

    #[test]
    fn test_local_commands() {
        assert_eq!(LocalCommand::parse(":clear"), Some(LocalCommand::Clear));
        assert_eq!(LocalCommand::parse(" :new "), Some(LocalCommand::New));
        assert_eq!(LocalCommand::parse(":quit"), Some(LocalCommand::Quit));
        assert_eq!(LocalCommand::parse("ls -la"), None);
        assert_eq!(LocalCommand::parse(":unknown"), None);
    }

    #[test]
    fn test_ws_url() {
        let session_id = SessionId::from("abc123");
        assert_eq!(
            ws_url("http://localhost:5000", &session_id, 42).unwrap(),
            "ws://localhost:5000/ws?sessionId=abc123&projectId=42"
        );
        assert_eq!(
            ws_url("https://example.com/app", &session_id, 1).unwrap(),
            "wss://example.com/ws?sessionId=abc123&projectId=1"
        );
        assert!(ws_url("not a url", &session_id, 1).is_err());
    }

    fn connected_view() -> TerminalView {
        let mut view = TerminalView::new();
        view.begin_session();
        view.session_allocated(SessionId::from("abc"));
        view.transport_opened();
        view
    }

    fn output(view: &mut TerminalView, data: &str) {
        view.handle_message(ServerMessage::Output {
            data: data.to_string(),
        });
    }

    #[test]
    fn test_render_after_clear_prints_every_new_line() {
        let mut view = connected_view();
        let mut renderer = Renderer::default();
        output(&mut view, "old-1\n");
        let mut shown = Vec::new();
        renderer.render_to(&view, &mut shown);
        assert_eq!(
            String::from_utf8(shown).unwrap(),
            "[Terminal connected]\nold-1\n"
        );

        renderer.clear(&mut view);
        // More lines than were printed before the clear
        for data in ["new-1\n", "new-2\n", "new-3\n"] {
            output(&mut view, data);
        }

        let mut shown = Vec::new();
        renderer.render_to(&view, &mut shown);
        assert_eq!(
            String::from_utf8(shown).unwrap(),
            "new-1\nnew-2\nnew-3\n"
        );
    }

    #[tokio::test]
    async fn test_send_line_encodes_input() {
        let mut view = connected_view();
        let (mut tx, mut rx) = mpsc::unbounded::<Message>();

        send_line(&mut view, &mut tx, "echo hi").await.unwrap();

        let sent = rx.next().await.unwrap();
        assert_eq!(
            sent,
            Message::Text(r#"{"type":"input","data":"echo hi\n"}"#.to_string())
        );
        assert_eq!(view.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_send_on_closed_transport_errors_view() {
        let mut view = connected_view();
        let (mut tx, rx) = mpsc::unbounded::<Message>();
        drop(rx);

        send_line(&mut view, &mut tx, "echo hi").await.unwrap();

        assert_eq!(view.state(), ConnectionState::Errored);
        assert!(!view.input_enabled());
        let last = view.scrollback().last().unwrap();
        assert!(last.text.starts_with("Connection error:"));
    }
}
