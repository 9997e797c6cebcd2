//! Process Launcher
//!
//! Spawns an interactive shell with piped stdio. Unlike a PTY, stdout and
//! stderr stay two independent pipes; their chunks are merged into a single
//! output sequence in arrival order, so ordering holds within each stream but
//! interleaving across the two is best-effort.
//!
//! ```text
//!   stdout ─► reader ─┐
//!                      ├─► mpsc ─► OutputStream (Output*, then one Exit)
//!   stderr ─► reader ─┘            ▲
//!   Child  ─► supervisor ──────────┘ (waits, drains readers, emits Exit)
//! ```

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default `TERM` for color-capable shell output
pub const DEFAULT_TERM: &str = "xterm-color";
/// Default shell program
pub const DEFAULT_SHELL: &str = "bash";
const DEFAULT_OUTPUT_BUFFER: usize = 256;
const DEFAULT_READ_CHUNK_BYTES: usize = 4096;
const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 500;
const MIN_READ_CHUNK_BYTES: usize = 16;

/// Configuration for spawned shells.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Shell program (resolved through `PATH`)
    pub program: String,
    /// Arguments passed to the shell
    pub args: Vec<String>,
    /// Value of `TERM` in the child environment
    pub term: String,
    /// Output events buffered before readers apply backpressure
    pub output_buffer: usize,
    /// Maximum bytes per pipe read
    pub read_chunk_bytes: usize,
    /// How long to wait for pipes to reach EOF after the process exits
    pub drain_timeout: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_SHELL.to_string(),
            args: Vec::new(),
            term: DEFAULT_TERM.to_string(),
            output_buffer: DEFAULT_OUTPUT_BUFFER,
            read_chunk_bytes: DEFAULT_READ_CHUNK_BYTES,
            drain_timeout: Duration::from_millis(DEFAULT_DRAIN_TIMEOUT_MS),
        }
    }
}

impl ShellConfig {
    /// Set the shell program
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the shell arguments
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the drain timeout
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }
}

/// Payload of an [`OutputEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputKind {
    /// Raw bytes from stdout or stderr
    Output(Vec<u8>),
    /// Process terminated with this code
    Exit(i32),
}

/// One item of a process's output sequence.
#[derive(Debug, Clone)]
pub struct OutputEvent {
    /// What happened
    pub kind: OutputKind,
    /// When the launcher observed it
    pub timestamp: DateTime<Utc>,
}

impl OutputEvent {
    fn output(data: Vec<u8>) -> Self {
        Self {
            kind: OutputKind::Output(data),
            timestamp: Utc::now(),
        }
    }

    fn exit(code: i32) -> Self {
        Self {
            kind: OutputKind::Exit(code),
            timestamp: Utc::now(),
        }
    }

    /// Whether this is the terminal exit notification
    #[must_use]
    pub fn is_exit(&self) -> bool {
        matches!(self.kind, OutputKind::Exit(_))
    }
}

/// Serialized writer for a process's stdin.
///
/// Cloning yields another handle to the same pipe; it does not own the process.
/// Closing is immediate: a write blocked on a full pipe is abandoned and the
/// pipe is dropped.
#[derive(Clone)]
pub struct StdinWriter {
    inner: Arc<Mutex<Option<ChildStdin>>>,
    closed: CancellationToken,
}

impl StdinWriter {
    fn new(stdin: Option<ChildStdin>) -> Self {
        let closed = CancellationToken::new();
        if stdin.is_none() {
            closed.cancel();
        }
        Self {
            inner: Arc::new(Mutex::new(stdin)),
            closed,
        }
    }

    /// Write all of `data` and flush.
    ///
    /// Fails with [`Error::BrokenPipe`] once the process has exited or the
    /// pipe was closed, including while this write is waiting on the pipe.
    pub async fn write(&self, data: &[u8]) -> Result<()> {
        let mut guard = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return Err(Error::BrokenPipe),
            guard = self.inner.lock() => guard,
        };
        let stdin = guard.as_mut().ok_or(Error::BrokenPipe)?;
        let written = tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(io::Error::from(io::ErrorKind::BrokenPipe)),
            written = async {
                stdin.write_all(data).await?;
                stdin.flush().await
            } => written,
        };
        if let Err(e) = written {
            debug!(error = %e, "stdin write failed, closing pipe");
            *guard = None;
            self.closed.cancel();
            return Err(Error::BrokenPipe);
        }
        Ok(())
    }

    /// Whether the pipe is still open
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.closed.is_cancelled()
    }

    /// Close the pipe without waiting for an in-flight write.
    fn close(&self) {
        self.closed.cancel();
        // A blocked writer holds the lock and drops the pipe itself
        if let Ok(mut guard) = self.inner.try_lock() {
            guard.take();
        }
    }
}

/// Idempotent kill switch for a process.
#[derive(Clone, Debug)]
pub struct ProcessKiller {
    token: CancellationToken,
}

impl ProcessKiller {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request termination. Safe to call any number of times, including after exit.
    pub fn kill(&self) {
        self.token.cancel();
    }

    /// Whether a kill has been requested
    #[must_use]
    pub fn is_killed(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Receiving end of a process's output sequence.
pub struct OutputStream {
    rx: mpsc::Receiver<OutputEvent>,
}

impl OutputStream {
    /// Next event; `None` after the exit event has been delivered.
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        self.rx.recv().await
    }
}

/// Owned handle to a running shell. Dropping it kills the process.
pub struct ProcessHandle {
    pid: Option<u32>,
    stdin: StdinWriter,
    killer: ProcessKiller,
    output: Option<OutputStream>,
}

impl ProcessHandle {
    /// OS process id (None if the process already exited before spawn returned)
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Non-owning stdin writer
    #[must_use]
    pub fn stdin(&self) -> StdinWriter {
        self.stdin.clone()
    }

    /// Non-owning kill switch
    #[must_use]
    pub fn killer(&self) -> ProcessKiller {
        self.killer.clone()
    }

    /// Take the output sequence. Only the first caller receives it.
    pub fn take_output(&mut self) -> Option<OutputStream> {
        self.output.take()
    }

    /// Send a termination signal (idempotent)
    pub fn kill(&self) {
        self.killer.kill();
    }

    /// Write to stdin (see [`StdinWriter::write`])
    pub async fn write_stdin(&self, data: &[u8]) -> Result<()> {
        self.stdin.write(data).await
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.killer.kill();
    }
}

/// Starts shell processes. Must be used from within a Tokio runtime.
#[derive(Debug, Clone)]
pub struct ShellLauncher {
    config: ShellConfig,
}

impl ShellLauncher {
    /// Create a launcher with the given shell configuration
    #[must_use]
    pub fn new(config: ShellConfig) -> Self {
        Self { config }
    }

    /// Shell configuration in use
    #[must_use]
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Spawn a shell in `cwd`.
    ///
    /// The host environment is inherited, `env` overrides are applied on top,
    /// and `TERM` is always set from the shell configuration.
    pub fn spawn(&self, cwd: &Path, env: &[(String, String)]) -> Result<ProcessHandle> {
        let mut std_cmd = std::process::Command::new(&self.config.program);
        std_cmd
            .args(&self.config.args)
            .current_dir(cwd)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .env("TERM", &self.config.term)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // The shell leads its own process group; kills target the whole group
            std_cmd.process_group(0);
        }
        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::Spawn(format!("{}: {}", self.config.program, e)))?;

        let pid = child.id();
        let stdin = StdinWriter::new(child.stdin.take());
        let (tx, rx) = mpsc::channel(self.config.output_buffer.max(1));

        let chunk_bytes = self.config.read_chunk_bytes.max(MIN_READ_CHUNK_BYTES);
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(pump_pipe(stdout, tx.clone(), chunk_bytes)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(pump_pipe(stderr, tx.clone(), chunk_bytes)));
        }

        let killer = ProcessKiller::new();
        tokio::spawn(supervise(
            child,
            readers,
            tx,
            stdin.clone(),
            killer.clone(),
            self.config.drain_timeout,
        ));

        info!(
            pid = ?pid,
            program = %self.config.program,
            cwd = %cwd.display(),
            "Shell process spawned"
        );

        Ok(ProcessHandle {
            pid,
            stdin,
            killer,
            output: Some(OutputStream { rx }),
        })
    }
}

/// Read one pipe until EOF, emitting chunks cut at UTF-8 boundaries.
async fn pump_pipe<R>(mut pipe: R, tx: mpsc::Sender<OutputEvent>, chunk_bytes: usize)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_bytes];
    let mut pending: Vec<u8> = Vec::new();
    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                let cut = utf8_boundary(&pending);
                if cut == 0 {
                    continue;
                }
                let tail = pending.split_off(cut);
                let chunk = std::mem::replace(&mut pending, tail);
                if tx.send(OutputEvent::output(chunk)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!(error = %e, "output pipe read failed");
                break;
            }
        }
    }
    if !pending.is_empty() {
        let _ = tx.send(OutputEvent::output(pending)).await;
    }
}

/// Length of the longest prefix of `bytes` that does not end inside a
/// multi-byte UTF-8 sequence.
pub(crate) fn utf8_boundary(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let byte = bytes[len - back];
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            0xF0..=0xF7 => 4,
            0xE0..=0xEF => 3,
            0xC0..=0xDF => 2,
            _ => 1,
        };
        return if width > back { len - back } else { len };
    }
    len
}

/// Own the child: wait for exit or a kill request, then drain and report.
async fn supervise(
    mut child: Child,
    readers: Vec<JoinHandle<()>>,
    tx: mpsc::Sender<OutputEvent>,
    stdin: StdinWriter,
    killer: ProcessKiller,
    drain_timeout: Duration,
) {
    let pid = child.id();
    let status = tokio::select! {
        status = child.wait() => status,
        _ = killer.token.cancelled() => {
            debug!(pid = ?pid, "Kill requested");
            kill_process_group(pid);
            if let Err(e) = child.start_kill() {
                debug!(pid = ?pid, error = %e, "start_kill failed (already exited?)");
            }
            child.wait().await
        }
    };

    stdin.close();

    let code = match status {
        Ok(status) => exit_code(&status),
        Err(e) => {
            warn!(pid = ?pid, error = %e, "Failed to wait for shell process");
            -1
        }
    };

    drain_readers(readers, drain_timeout).await;
    let _ = tx.send(OutputEvent::exit(code)).await;
    info!(pid = ?pid, code, "Shell process exited");
}

/// Wait for readers to hit EOF; a grandchild holding a pipe open must not
/// delay the exit notification past `timeout`.
async fn drain_readers(readers: Vec<JoinHandle<()>>, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    for mut reader in readers {
        if tokio::time::timeout_at(deadline, &mut reader).await.is_err() {
            reader.abort();
            let _ = reader.await;
            debug!("Output pipe still open after exit, reader aborted");
        }
    }
}

/// SIGKILL every process in the shell's group, so jobs it started cannot
/// keep the pipes open. The group id equals the unreaped shell's pid.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pgid) = pid.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        debug!(pgid, error = %e, "killpg failed (group already gone?)");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
