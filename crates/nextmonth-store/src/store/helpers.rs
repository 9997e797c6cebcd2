//! Helper functions for store module

use crate::error::Error;
use crate::models::{FileNode, Project, ProjectSettings, TerminalSessionRecord};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

pub(crate) fn db_error(e: sqlx::Error) -> Error {
    Error::Database(e.to_string())
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Serialization(format!("invalid timestamp: {e}")))
}

/// Convert a SQLite row to a Project
pub(crate) fn row_to_project(row: SqliteRow) -> Result<Project, Error> {
    let settings_str: String = row.get("settings");
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    let settings: ProjectSettings = serde_json::from_str(&settings_str)
        .map_err(|e| Error::Serialization(format!("invalid settings: {e}")))?;

    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        template: row.get("template"),
        user_id: row.get("user_id"),
        settings,
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

/// Convert a SQLite row to a FileNode
pub(crate) fn row_to_file(row: SqliteRow) -> Result<FileNode, Error> {
    let created_at_str: String = row.get("created_at");
    let updated_at_str: String = row.get("updated_at");

    Ok(FileNode {
        id: row.get("id"),
        name: row.get("name"),
        path: row.get("path"),
        content: row.get("content"),
        is_directory: row.get("is_directory"),
        parent_id: row.get("parent_id"),
        project_id: row.get("project_id"),
        created_at: parse_timestamp(&created_at_str)?,
        updated_at: parse_timestamp(&updated_at_str)?,
    })
}

/// Convert a SQLite row to a TerminalSessionRecord
pub(crate) fn row_to_terminal_session(row: SqliteRow) -> Result<TerminalSessionRecord, Error> {
    let created_at_str: String = row.get("created_at");
    let closed_at_str: Option<String> = row.get("closed_at");

    Ok(TerminalSessionRecord {
        id: row.get("id"),
        project_id: row.get("project_id"),
        session_id: row.get("session_id"),
        is_active: row.get("is_active"),
        created_at: parse_timestamp(&created_at_str)?,
        closed_at: closed_at_str.as_deref().map(parse_timestamp).transpose()?,
    })
}

/// Get the default data directory for NextMonth
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".nextmonth"))
        .unwrap_or_else(|| std::path::PathBuf::from(".nextmonth"))
}

/// Get the default database path
pub fn default_db_path() -> std::path::PathBuf {
    default_data_dir().join("nextmonth.db")
}
