//! Workspace records

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Editor preferences stored with a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Editor color theme
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Indentation width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_size: Option<u32>,
    /// Soft wrap long lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_wrap: Option<bool>,
}

/// A workspace project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Row id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Template the project was created from
    pub template: String,
    /// Owner
    pub user_id: i64,
    /// Editor preferences
    pub settings: ProjectSettings,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a project
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Template name
    pub template: String,
    /// Owner
    pub user_id: i64,
    /// Editor preferences
    pub settings: ProjectSettings,
}

impl NewProject {
    /// Create with the required fields
    pub fn new(name: impl Into<String>, template: impl Into<String>, user_id: i64) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            user_id,
            ..Default::default()
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("project name is required".to_string()));
        }
        if self.template.trim().is_empty() {
            return Err(Error::InvalidInput("project template is required".to_string()));
        }
        Ok(())
    }
}

/// Partial project update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New template
    pub template: Option<String>,
    /// New settings
    pub settings: Option<ProjectSettings>,
}

impl ProjectUpdate {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(Error::InvalidInput("project name cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// A file or directory in a project's tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    /// Row id
    pub id: i64,
    /// Base name
    pub name: String,
    /// Absolute path within the project, e.g. `/src/index.js`
    pub path: String,
    /// Text content (directories have none)
    pub content: Option<String>,
    /// Whether this node is a directory
    pub is_directory: bool,
    /// Parent directory node
    pub parent_id: Option<i64>,
    /// Owning project
    pub project_id: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a file
#[derive(Debug, Clone, Default)]
pub struct NewFile {
    /// Owning project
    pub project_id: i64,
    /// Base name
    pub name: String,
    /// Absolute path within the project
    pub path: String,
    /// Text content
    pub content: Option<String>,
    /// Whether this node is a directory
    pub is_directory: bool,
    /// Parent directory node
    pub parent_id: Option<i64>,
}

impl NewFile {
    /// A regular file
    pub fn file(
        project_id: i64,
        name: impl Into<String>,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            name: name.into(),
            path: path.into(),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// A directory
    pub fn directory(project_id: i64, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            project_id,
            name: name.into(),
            path: path.into(),
            is_directory: true,
            ..Default::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidInput("file name is required".to_string()));
        }
        if !self.path.starts_with('/') {
            return Err(Error::InvalidInput(format!(
                "file path must be absolute: {}",
                self.path
            )));
        }
        Ok(())
    }
}

/// Partial file update
#[derive(Debug, Clone, Default)]
pub struct UpdateFile {
    /// New base name
    pub name: Option<String>,
    /// New content
    pub content: Option<String>,
}

/// Audit row for a terminal session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalSessionRecord {
    /// Row id
    pub id: i64,
    /// Project the session was opened for
    pub project_id: i64,
    /// Session token
    pub session_id: String,
    /// False once the session was torn down
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Teardown time
    pub closed_at: Option<DateTime<Utc>>,
}
