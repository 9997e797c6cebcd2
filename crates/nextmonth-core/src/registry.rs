//! Session Registry
//!
//! Process-wide map from session token to its shell process. The registry is
//! the only writer of the map and the single source of truth for whether a
//! session is alive.
//!
//! Lifecycle:
//! - `create` issues a token; no process is spawned yet
//! - `attach` binds the first transport, spawning the shell under the write lock
//! - `remove` drops the entry, which kills the shell; idempotent

use crate::audit::SessionAuditStore;
use crate::error::{Error, Result};
use crate::process::{OutputStream, ProcessHandle, ProcessKiller, ShellLauncher, StdinWriter};
use crate::session::{ProjectId, SessionId, SessionSummary};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where and how sessions' shells are started.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Working directory for every shell
    pub cwd: PathBuf,
    /// Environment overrides applied on top of the host environment
    pub env: Vec<(String, String)>,
}

impl RegistryConfig {
    /// Use the server process's own working directory
    pub fn from_current_dir() -> Result<Self> {
        Ok(Self {
            cwd: std::env::current_dir()?,
            env: Vec::new(),
        })
    }
}

struct SessionEntry {
    project_id: ProjectId,
    process: Option<ProcessHandle>,
    attached: bool,
    created_at: DateTime<Utc>,
    created: Instant,
    attached_at: Option<DateTime<Utc>>,
}

impl SessionEntry {
    fn new(project_id: ProjectId) -> Self {
        Self {
            project_id,
            process: None,
            attached: false,
            created_at: Utc::now(),
            created: Instant::now(),
            attached_at: None,
        }
    }

    fn summary(&self, session_id: &SessionId) -> SessionSummary {
        SessionSummary {
            session_id: session_id.clone(),
            project_id: self.project_id,
            attached: self.attached,
            pid: self.process.as_ref().and_then(ProcessHandle::pid),
            created_at: self.created_at,
            attached_at: self.attached_at,
        }
    }
}

/// Live pair handed to the Transport Bridge after a successful attach.
///
/// Holds only non-owning references to the process: the registry entry keeps
/// ownership, so removing the entry still kills the shell.
pub struct Attachment {
    /// Session token
    pub session_id: SessionId,
    /// Owning project
    pub project_id: ProjectId,
    /// Shell process id
    pub pid: Option<u32>,
    /// Writer for the shell's stdin
    pub stdin: StdinWriter,
    /// Kill switch for the shell
    pub killer: ProcessKiller,
    /// The shell's output sequence
    pub output: OutputStream,
}

/// Session Registry
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    launcher: ShellLauncher,
    config: RegistryConfig,
    audit: Arc<dyn SessionAuditStore>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new(
        launcher: ShellLauncher,
        config: RegistryConfig,
        audit: Arc<dyn SessionAuditStore>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            launcher,
            config,
            audit,
        }
    }

    /// Issue a new session token for `project_id`.
    ///
    /// The shell is spawned lazily on first attach.
    pub async fn create(&self, project_id: ProjectId) -> SessionId {
        let session_id = {
            let mut sessions = self.sessions.write().await;
            let session_id = loop {
                let candidate = SessionId::generate();
                if !sessions.contains_key(&candidate) {
                    break candidate;
                }
            };
            sessions.insert(session_id.clone(), SessionEntry::new(project_id));
            session_id
        };

        if let Err(e) = self.audit.record_created(project_id, &session_id).await {
            warn!(
                session_id = %session_id,
                store = self.audit.name(),
                error = %e,
                "Failed to record terminal session"
            );
        }

        info!(session_id = %session_id, project_id, "Terminal session created");
        session_id
    }

    /// Bind a transport to a session, spawning its shell if needed.
    ///
    /// Fails with [`Error::NotFound`] for unknown tokens or a project mismatch,
    /// [`Error::AlreadyAttached`] if a transport is already bound, and
    /// [`Error::Spawn`] if the shell cannot start (the entry is then removed).
    pub async fn attach(&self, session_id: &SessionId, project_id: ProjectId) -> Result<Attachment> {
        let mut sessions = self.sessions.write().await;

        let entry = match sessions.get_mut(session_id) {
            Some(entry) if entry.project_id == project_id => entry,
            Some(entry) => {
                debug!(
                    session_id = %session_id,
                    expected = entry.project_id,
                    got = project_id,
                    "Attach with mismatched project"
                );
                return Err(Error::NotFound(session_id.to_string()));
            }
            None => return Err(Error::NotFound(session_id.to_string())),
        };

        if entry.attached {
            return Err(Error::AlreadyAttached(session_id.to_string()));
        }

        if entry.process.is_none() {
            match self.launcher.spawn(&self.config.cwd, &self.config.env) {
                Ok(process) => entry.process = Some(process),
                Err(e) => {
                    sessions.remove(session_id);
                    drop(sessions);
                    warn!(session_id = %session_id, error = %e, "Shell spawn failed");
                    self.record_closed(session_id).await;
                    return Err(e);
                }
            }
        }

        let Some(process) = entry.process.as_mut() else {
            return Err(Error::NotFound(session_id.to_string()));
        };
        let Some(output) = process.take_output() else {
            return Err(Error::AlreadyAttached(session_id.to_string()));
        };

        let attachment = Attachment {
            session_id: session_id.clone(),
            project_id,
            pid: process.pid(),
            stdin: process.stdin(),
            killer: process.killer(),
            output,
        };
        entry.attached = true;
        entry.attached_at = Some(Utc::now());

        info!(session_id = %session_id, pid = ?attachment.pid, "Transport attached");
        Ok(attachment)
    }

    /// Remove a session, killing its shell. Returns whether an entry existed.
    pub async fn remove(&self, session_id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(session_id);
        match removed {
            Some(entry) => {
                drop(entry);
                self.record_closed(session_id).await;
                info!(session_id = %session_id, "Terminal session removed");
                true
            }
            None => false,
        }
    }

    /// Remove sessions that were created but never attached within `max_age`.
    pub async fn expire_unattached(&self, max_age: Duration) -> Vec<SessionId> {
        let now = Instant::now();
        let expired: Vec<SessionId> = {
            let mut sessions = self.sessions.write().await;
            let stale: Vec<SessionId> = sessions
                .iter()
                .filter(|(_, e)| !e.attached && now.duration_since(e.created) >= max_age)
                .map(|(id, _)| id.clone())
                .collect();
            for id in &stale {
                sessions.remove(id);
            }
            stale
        };

        for id in &expired {
            self.record_closed(id).await;
            info!(session_id = %id, "Expired unattached terminal session");
        }
        expired
    }

    /// Remove every session (server shutdown).
    pub async fn shutdown(&self) -> usize {
        let drained: Vec<(SessionId, SessionEntry)> =
            self.sessions.write().await.drain().collect();
        let count = drained.len();
        for (id, entry) in drained {
            drop(entry);
            self.record_closed(&id).await;
        }
        if count > 0 {
            info!(count, "Terminated remaining terminal sessions");
        }
        count
    }

    /// Whether the session is registered
    pub async fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Number of registered sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no sessions are registered
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Snapshot of registered sessions, oldest first
    pub async fn list(&self) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;
        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .map(|(id, entry)| entry.summary(id))
            .collect();
        summaries.sort_by_key(|s| s.created_at);
        summaries
    }

    /// Spawn a background task that expires unattached sessions every
    /// `interval` until `cancel` fires.
    pub fn spawn_expiry_sweeper(
        self: Arc<Self>,
        max_age: Duration,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let expired = self.expire_unattached(max_age).await;
                        if !expired.is_empty() {
                            debug!(count = expired.len(), "Session sweep complete");
                        }
                    }
                }
            }
            debug!("Session expiry sweeper stopped");
        })
    }

    async fn record_closed(&self, session_id: &SessionId) {
        if let Err(e) = self.audit.record_closed(session_id).await {
            warn!(
                session_id = %session_id,
                store = self.audit.name(),
                error = %e,
                "Failed to mark terminal session closed"
            );
        }
    }
}

#[cfg(test)]
mod tests;
