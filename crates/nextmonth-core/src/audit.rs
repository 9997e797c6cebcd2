//! Session audit seam
//!
//! The registry reports session lifecycle to an external store for
//! observability only; liveness is never read back from it.

use crate::error::Result;
use crate::session::{ProjectId, SessionId};
use async_trait::async_trait;

/// Trait for recording terminal session lifecycle
///
/// Implemented by the persistence collaborator; failures are logged by the
/// registry and never affect the session itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionAuditStore: Send + Sync {
    /// A session token was issued for a project
    async fn record_created(&self, project_id: ProjectId, session_id: &SessionId) -> Result<()>;

    /// A session was torn down
    async fn record_closed(&self, session_id: &SessionId) -> Result<()>;

    /// Store name (for logging)
    fn name(&self) -> &'static str;
}

/// Audit store that records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditStore;

#[async_trait]
impl SessionAuditStore for NoopAuditStore {
    async fn record_created(&self, _project_id: ProjectId, _session_id: &SessionId) -> Result<()> {
        Ok(())
    }

    async fn record_closed(&self, _session_id: &SessionId) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
