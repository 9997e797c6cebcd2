//! File tree operations

use super::helpers::{db_error, row_to_file};
use super::WorkspaceStore;
use crate::error::{Error, Result};
use crate::models::{FileNode, NewFile, UpdateFile};
use chrono::Utc;
use tracing::{debug, instrument};

const FILE_COLUMNS: &str =
    "id, name, path, content, is_directory, parent_id, project_id, created_at, updated_at";

impl WorkspaceStore {
    /// All nodes of a project's file tree, ordered by path
    #[instrument(skip(self))]
    pub async fn files_for_project(&self, project_id: i64) -> Result<Vec<FileNode>> {
        let rows = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE project_id = ?1 ORDER BY path"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(row_to_file).collect()
    }

    /// Get a file by ID
    #[instrument(skip(self))]
    pub async fn get_file(&self, id: i64) -> Result<FileNode> {
        let row = sqlx::query(&format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or_else(|| Error::NotFound(format!("file {id}")))?;

        row_to_file(row)
    }

    /// Find a file by its path within a project
    #[instrument(skip(self))]
    pub async fn get_file_by_path(&self, project_id: i64, path: &str) -> Result<Option<FileNode>> {
        let row = sqlx::query(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE project_id = ?1 AND path = ?2"
        ))
        .bind(project_id)
        .bind(path)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(row_to_file).transpose()
    }

    /// Create a file or directory in an existing project
    #[instrument(skip(self, file), fields(project_id = file.project_id, path = %file.path))]
    pub async fn create_file(&self, file: &NewFile) -> Result<FileNode> {
        file.validate()?;
        // Surfaces a missing project as NotFound rather than a constraint error
        self.get_project(file.project_id).await?;

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO files (name, path, content, is_directory, parent_id, project_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&file.name)
        .bind(&file.path)
        .bind(&file.content)
        .bind(file.is_directory)
        .bind(file.parent_id)
        .bind(file.project_id)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = result.last_insert_rowid();
        debug!("Created file {} ({})", id, file.path);
        self.get_file(id).await
    }

    /// Rename a file or replace its content
    #[instrument(skip(self, update))]
    pub async fn update_file(&self, id: i64, update: &UpdateFile) -> Result<FileNode> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::InvalidInput("file name cannot be empty".to_string()));
        }

        let result = sqlx::query(
            r#"
            UPDATE files
            SET name = COALESCE(?2, name), content = COALESCE(?3, content), updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.content)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("file {id}")));
        }
        self.get_file(id).await
    }

    /// Delete a file (and, for directories, its children). Returns whether
    /// it existed.
    #[instrument(skip(self))]
    pub async fn delete_file(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
