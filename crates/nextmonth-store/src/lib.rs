//! NextMonth Store - Workspace persistence
//!
//! SQLite storage for the workspace's projects and files, plus the audit
//! trail of terminal sessions. Uses sqlx (embedded, no external database).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod scaffold;
pub mod store;

pub use error::{Error, Result};
pub use models::{
    FileNode, NewFile, NewProject, Project, ProjectSettings, ProjectUpdate, TerminalSessionRecord,
    UpdateFile,
};
pub use scaffold::{initial_files, is_builder_template};
pub use store::{default_data_dir, default_db_path, WorkspaceStore};
