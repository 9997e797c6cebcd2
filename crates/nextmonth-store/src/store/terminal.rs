//! Terminal session audit trail
//!
//! Rows are written for observability only. Whether a session is alive is
//! decided by the in-memory registry, never by these rows.

use super::helpers::{db_error, row_to_terminal_session};
use super::WorkspaceStore;
use crate::error::{Error, Result};
use crate::models::TerminalSessionRecord;
use chrono::Utc;
use tracing::{debug, info, instrument};

const SESSION_COLUMNS: &str = "id, project_id, session_id, is_active, created_at, closed_at";

impl WorkspaceStore {
    /// Record a newly issued session token
    #[instrument(skip(self))]
    pub async fn create_terminal_session(
        &self,
        project_id: i64,
        session_id: &str,
    ) -> Result<TerminalSessionRecord> {
        sqlx::query(
            r#"
            INSERT INTO terminal_sessions (project_id, session_id, is_active, created_at)
            VALUES (?1, ?2, 1, ?3)
            "#,
        )
        .bind(project_id)
        .bind(session_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!("Recorded terminal session {}", session_id);
        self.get_terminal_session(session_id).await
    }

    /// Get a session record by token
    #[instrument(skip(self))]
    pub async fn get_terminal_session(&self, session_id: &str) -> Result<TerminalSessionRecord> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM terminal_sessions WHERE session_id = ?1"
        ))
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| Error::NotFound(format!("terminal session {session_id}")))?;

        row_to_terminal_session(row)
    }

    /// Mark a session closed. Returns false if it was unknown or already closed.
    #[instrument(skip(self))]
    pub async fn deactivate_terminal_session(&self, session_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE terminal_sessions
            SET is_active = 0, closed_at = ?2
            WHERE session_id = ?1 AND is_active = 1
            "#,
        )
        .bind(session_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }

    /// Sessions still marked active, newest first
    #[instrument(skip(self))]
    pub async fn active_terminal_sessions(&self) -> Result<Vec<TerminalSessionRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM terminal_sessions WHERE is_active = 1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(row_to_terminal_session).collect()
    }

    /// Close every row left active by a previous server run.
    ///
    /// Shell processes never survive a restart, so on startup all active
    /// rows are stale.
    pub async fn close_stale_terminal_sessions(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE terminal_sessions SET is_active = 0, closed_at = ?1 WHERE is_active = 1",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let closed = result.rows_affected();
        if closed > 0 {
            info!("Closed {} stale terminal session records", closed);
        }
        Ok(closed)
    }
}
