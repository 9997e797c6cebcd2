//! Project operations

use super::helpers::{db_error, row_to_file, row_to_project};
use super::WorkspaceStore;
use crate::error::{Error, Result};
use crate::models::{FileNode, NewProject, Project, ProjectUpdate};
use crate::scaffold::initial_files;
use chrono::Utc;
use tracing::{debug, instrument};

const PROJECT_COLUMNS: &str =
    "id, name, description, template, user_id, settings, created_at, updated_at";

fn encode_settings<T: serde::Serialize>(settings: &T) -> Result<String> {
    serde_json::to_string(settings).map_err(|e| Error::Serialization(e.to_string()))
}

impl WorkspaceStore {
    /// List a user's projects, most recently updated first
    #[instrument(skip(self))]
    pub async fn list_projects(&self, user_id: i64) -> Result<Vec<Project>> {
        let rows = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE user_id = ?1 \
             ORDER BY updated_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(row_to_project).collect()
    }

    /// Get a project by ID
    #[instrument(skip(self))]
    pub async fn get_project(&self, id: i64) -> Result<Project> {
        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| Error::NotFound(format!("project {id}")))?;

        row_to_project(row)
    }

    /// Create a project without any files
    #[instrument(skip(self, project), fields(name = %project.name))]
    pub async fn create_project(&self, project: &NewProject) -> Result<Project> {
        project.validate()?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO projects (name, description, template, user_id, settings, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.template)
        .bind(project.user_id)
        .bind(encode_settings(&project.settings)?)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        let id = result.last_insert_rowid();
        debug!("Created project {}", id);
        self.get_project(id).await
    }

    /// Create a project together with its starter files in one transaction
    #[instrument(skip(self, project), fields(name = %project.name, template = %project.template))]
    pub async fn create_project_scaffolded(
        &self,
        project: &NewProject,
    ) -> Result<(Project, Vec<FileNode>)> {
        project.validate()?;
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let id = sqlx::query(
            r#"
            INSERT INTO projects (name, description, template, user_id, settings, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.template)
        .bind(project.user_id)
        .bind(encode_settings(&project.settings)?)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .last_insert_rowid();

        let row = sqlx::query(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        let created = row_to_project(row)?;

        let mut files = Vec::new();
        for file in initial_files(&created) {
            let file_id = sqlx::query(
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
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .last_insert_rowid();

            let row = sqlx::query(
                "SELECT id, name, path, content, is_directory, parent_id, project_id, created_at, updated_at \
                 FROM files WHERE id = ?1",
            )
            .bind(file_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error)?;
            files.push(row_to_file(row)?);
        }

        tx.commit().await.map_err(db_error)?;

        debug!("Created project {} with {} files", created.id, files.len());
        Ok((created, files))
    }

    /// Apply a partial update to a project
    #[instrument(skip(self, update))]
    pub async fn update_project(&self, id: i64, update: &ProjectUpdate) -> Result<Project> {
        update.validate()?;
        let current = self.get_project(id).await?;

        let settings = update.settings.as_ref().unwrap_or(&current.settings);
        sqlx::query(
            r#"
            UPDATE projects
            SET name = ?2, description = ?3, template = ?4, settings = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.as_ref().unwrap_or(&current.name))
        .bind(update.description.as_ref().or(current.description.as_ref()))
        .bind(update.template.as_ref().unwrap_or(&current.template))
        .bind(encode_settings(settings)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!("Updated project {}", id);
        self.get_project(id).await
    }

    /// Delete a project and its files. Returns whether it existed.
    #[instrument(skip(self))]
    pub async fn delete_project(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM files WHERE project_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let result = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}
