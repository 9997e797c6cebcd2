//! Tests for store module

use super::*;
use crate::error::Error;
use crate::models::{NewFile, NewProject, ProjectSettings, ProjectUpdate, UpdateFile};

#[test]
fn test_default_data_dir() {
    let dir = default_data_dir();
    assert!(dir.to_string_lossy().contains("nextmonth"));
    assert!(default_db_path().ends_with("nextmonth.db"));
}

#[tokio::test]
async fn test_in_memory_store() {
    let store = WorkspaceStore::in_memory().await.unwrap();
    assert_eq!(store.name(), "sqlite");
    store.ping().await.unwrap();
}

#[tokio::test]
async fn test_project_crud() {
    let store = WorkspaceStore::in_memory().await.unwrap();

    let created = store
        .create_project(&NewProject::new("alpha", "node", 1).with_description("first"))
        .await
        .unwrap();
    assert_eq!(created.name, "alpha");
    assert_eq!(created.description.as_deref(), Some("first"));
    assert_eq!(created.settings, ProjectSettings::default());

    let fetched = store.get_project(created.id).await.unwrap();
    assert_eq!(fetched, created);

    let updated = store
        .update_project(
            created.id,
            &ProjectUpdate {
                name: Some("beta".to_string()),
                settings: Some(ProjectSettings {
                    theme: Some("dark".to_string()),
                    tab_size: Some(2),
                    word_wrap: Some(true),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "beta");
    assert_eq!(updated.template, "node");
    assert_eq!(updated.description.as_deref(), Some("first"));
    assert_eq!(updated.settings.tab_size, Some(2));

    assert!(store.delete_project(created.id).await.unwrap());
    assert!(!store.delete_project(created.id).await.unwrap());
    assert!(matches!(
        store.get_project(created.id).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_list_projects_by_user() {
    let store = WorkspaceStore::in_memory().await.unwrap();
    let first = store.create_project(&NewProject::new("one", "node", 1)).await.unwrap();
    let second = store.create_project(&NewProject::new("two", "node", 1)).await.unwrap();
    store.create_project(&NewProject::new("other", "node", 2)).await.unwrap();

    let projects = store.list_projects(1).await.unwrap();
    let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_project_validation() {
    let store = WorkspaceStore::in_memory().await.unwrap();
    let err = store
        .create_project(&NewProject::new("  ", "node", 1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = store
        .update_project(
            1,
            &ProjectUpdate {
                name: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_scaffolded_project() {
    let store = WorkspaceStore::in_memory().await.unwrap();
    let (project, files) = store
        .create_project_scaffolded(&NewProject::new("shop", "saas-starter", 1))
        .await
        .unwrap();

    assert_eq!(files.len(), 4);
    let stored = store.files_for_project(project.id).await.unwrap();
    let paths: Vec<&str> = stored.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["/README.md", "/builder.config.js", "/package.json", "/src"]
    );

    let src = store
        .get_file_by_path(project.id, "/src")
        .await
        .unwrap()
        .unwrap();
    assert!(src.is_directory);
}

#[tokio::test]
async fn test_file_crud() {
    let store = WorkspaceStore::in_memory().await.unwrap();
    let project = store.create_project(&NewProject::new("p", "node", 1)).await.unwrap();

    let dir = store
        .create_file(&NewFile::directory(project.id, "lib", "/lib"))
        .await
        .unwrap();
    let file = store
        .create_file(&NewFile {
            parent_id: Some(dir.id),
            ..NewFile::file(project.id, "a.js", "/lib/a.js", "let a = 1;")
        })
        .await
        .unwrap();
    assert_eq!(file.parent_id, Some(dir.id));
    assert!(!file.is_directory);

    let updated = store
        .update_file(
            file.id,
            &UpdateFile {
                content: Some("let a = 2;".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.content.as_deref(), Some("let a = 2;"));
    assert_eq!(updated.name, "a.js");

    assert!(store.delete_file(file.id).await.unwrap());
    assert!(!store.delete_file(file.id).await.unwrap());
    assert!(matches!(
        store.update_file(file.id, &UpdateFile::default()).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_file_requires_project() {
    let store = WorkspaceStore::in_memory().await.unwrap();
    let err = store
        .create_file(&NewFile::file(99, "x", "/x", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = store
        .create_file(&NewFile::file(99, "x", "relative/x", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn test_delete_project_removes_files() {
    let store = WorkspaceStore::in_memory().await.unwrap();
    let (project, _) = store
        .create_project_scaffolded(&NewProject::new("p", "node", 1))
        .await
        .unwrap();

    store.delete_project(project.id).await.unwrap();
    assert!(store.files_for_project(project.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_terminal_session_lifecycle() {
    let store = WorkspaceStore::in_memory().await.unwrap();

    let record = store.create_terminal_session(42, "abc123").await.unwrap();
    assert_eq!(record.project_id, 42);
    assert!(record.is_active);
    assert!(record.closed_at.is_none());

    // Duplicate tokens are rejected
    assert!(store.create_terminal_session(42, "abc123").await.is_err());

    assert!(store.deactivate_terminal_session("abc123").await.unwrap());
    assert!(!store.deactivate_terminal_session("abc123").await.unwrap());

    let closed = store.get_terminal_session("abc123").await.unwrap();
    assert!(!closed.is_active);
    assert!(closed.closed_at.is_some());
}

#[tokio::test]
async fn test_close_stale_terminal_sessions() {
    let store = WorkspaceStore::in_memory().await.unwrap();
    store.create_terminal_session(1, "a").await.unwrap();
    store.create_terminal_session(1, "b").await.unwrap();
    store.deactivate_terminal_session("a").await.unwrap();

    assert_eq!(store.active_terminal_sessions().await.unwrap().len(), 1);
    assert_eq!(store.close_stale_terminal_sessions().await.unwrap(), 1);
    assert!(store.active_terminal_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_file_backed_store_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("workspace.db");

    let id = {
        let store = WorkspaceStore::from_path(&path).await.unwrap();
        store
            .create_project(&NewProject::new("kept", "node", 1))
            .await
            .unwrap()
            .id
    };

    let reopened = WorkspaceStore::from_path(&path).await.unwrap();
    assert_eq!(reopened.get_project(id).await.unwrap().name, "kept");
}
