//! Store adapter types
//!
//! Bridges the workspace store into the terminal engine's audit seam.

use nextmonth_core::{ProjectId, SessionAuditStore, SessionId};
use nextmonth_store::WorkspaceStore;
use std::sync::Arc;

/// Adapter to use WorkspaceStore as SessionAuditStore
pub struct StoreAuditAdapter {
    pub(crate) store: Arc<WorkspaceStore>,
}

impl StoreAuditAdapter {
    pub fn new(store: Arc<WorkspaceStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl SessionAuditStore for StoreAuditAdapter {
    async fn record_created(
        &self,
        project_id: ProjectId,
        session_id: &SessionId,
    ) -> nextmonth_core::Result<()> {
        self.store
            .create_terminal_session(project_id, session_id.as_str())
            .await
            .map(|_| ())
            .map_err(|e| nextmonth_core::Error::Audit(e.to_string()))
    }

    async fn record_closed(&self, session_id: &SessionId) -> nextmonth_core::Result<()> {
        self.store
            .deactivate_terminal_session(session_id.as_str())
            .await
            .map(|_| ())
            .map_err(|e| nextmonth_core::Error::Audit(e.to_string()))
    }

    fn name(&self) -> &'static str {
        self.store.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_audit_rows_follow_lifecycle() {
        let store = Arc::new(WorkspaceStore::in_memory().await.unwrap());
        let adapter = StoreAuditAdapter::new(store.clone());
        let id = SessionId::generate();

        adapter.record_created(42, &id).await.unwrap();
        let record = store.get_terminal_session(id.as_str()).await.unwrap();
        assert_eq!(record.project_id, 42);
        assert!(record.is_active);

        adapter.record_closed(&id).await.unwrap();
        assert!(!store.get_terminal_session(id.as_str()).await.unwrap().is_active);
        assert_eq!(adapter.name(), "sqlite");
    }

    #[tokio::test]
    async fn test_duplicate_token_is_audit_error() {
        let store = Arc::new(WorkspaceStore::in_memory().await.unwrap());
        let adapter = StoreAuditAdapter::new(store);
        let id = SessionId::generate();

        adapter.record_created(1, &id).await.unwrap();
        let err = adapter.record_created(1, &id).await.unwrap_err();
        assert!(matches!(err, nextmonth_core::Error::Audit(_)));
    }
}
