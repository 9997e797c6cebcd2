//! Store - Workspace persistence using SQLite
//!
//! Projects and their file trees, plus the terminal session audit trail.

mod files;
mod helpers;
mod projects;
mod terminal;
mod workspace_store;

#[cfg(test)]
mod tests;

pub use helpers::{default_data_dir, default_db_path};
pub use workspace_store::WorkspaceStore;
