use super::*;
use crate::audit::{MockSessionAuditStore, NoopAuditStore};
use crate::process::{OutputKind, ShellConfig};
use std::sync::atomic::{AtomicUsize, Ordering};

fn sh_registry(audit: Arc<dyn SessionAuditStore>) -> SessionRegistry {
    SessionRegistry::new(
        ShellLauncher::new(ShellConfig::default().with_program("sh")),
        RegistryConfig::from_current_dir().unwrap(),
        audit,
    )
}

fn registry() -> SessionRegistry {
    sh_registry(Arc::new(NoopAuditStore))
}

async fn wait_for_exit(output: &mut OutputStream) -> i32 {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), output.recv())
            .await
            .expect("timed out waiting for exit")
            .expect("output ended without exit");
        if let OutputKind::Exit(code) = event.kind {
            return code;
        }
    }
}

#[tokio::test]
async fn test_create_does_not_spawn() {
    let registry = registry();
    let id = registry.create(7).await;

    assert!(registry.contains(&id).await);
    let list = registry.list().await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].project_id, 7);
    assert!(!list[0].attached);
    assert!(list[0].pid.is_none());
}

#[tokio::test]
async fn test_session_ids_are_unique() {
    let registry = registry();
    let a = registry.create(1).await;
    let b = registry.create(1).await;
    assert_ne!(a, b);
    assert_eq!(registry.len().await, 2);
}

#[tokio::test]
async fn test_attach_spawns_shell() {
    let registry = registry();
    let id = registry.create(3).await;

    let mut attachment = registry.attach(&id, 3).await.unwrap();
    assert_eq!(attachment.session_id, id);
    assert!(attachment.pid.is_some());

    let list = registry.list().await;
    assert!(list[0].attached);
    assert!(list[0].attached_at.is_some());

    attachment.stdin.write(b"exit 5\n").await.unwrap();
    assert_eq!(wait_for_exit(&mut attachment.output).await, 5);
}

#[tokio::test]
async fn test_second_attach_is_refused() {
    let registry = registry();
    let id = registry.create(3).await;

    let _first = registry.attach(&id, 3).await.unwrap();
    let err = registry.attach(&id, 3).await.err().unwrap();
    assert!(matches!(err, Error::AlreadyAttached(_)));
    assert!(registry.contains(&id).await);
}

#[tokio::test]
async fn test_attach_unknown_session() {
    let registry = registry();
    let err = registry
        .attach(&SessionId::from("missing"), 1)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_attach_with_wrong_project() {
    let registry = registry();
    let id = registry.create(1).await;

    let err = registry.attach(&id, 2).await.err().unwrap();
    assert!(matches!(err, Error::NotFound(_)));

    // The session is still attachable by its own project
    assert!(registry.attach(&id, 1).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_attach_has_single_winner() {
    let registry = Arc::new(registry());
    let id = registry.create(9).await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let registry = Arc::clone(&registry);
        let id = id.clone();
        tasks.push(tokio::spawn(async move { registry.attach(&id, 9).await.is_ok() }));
    }

    let mut winners = 0;
    for task in tasks {
        if task.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_remove_kills_and_is_idempotent() {
    let registry = registry();
    let id = registry.create(4).await;
    let mut attachment = registry.attach(&id, 4).await.unwrap();

    assert!(registry.remove(&id).await);
    assert!(!registry.remove(&id).await);
    assert!(registry.is_empty().await);

    let code = wait_for_exit(&mut attachment.output).await;
    assert_ne!(code, 0);
}

#[tokio::test]
async fn test_spawn_failure_removes_entry() {
    let registry = SessionRegistry::new(
        ShellLauncher::new(ShellConfig::default().with_program("/nonexistent/nextmonth-shell")),
        RegistryConfig::from_current_dir().unwrap(),
        Arc::new(NoopAuditStore),
    );
    let id = registry.create(1).await;

    let err = registry.attach(&id, 1).await.err().unwrap();
    assert!(matches!(err, Error::Spawn(_)));
    assert!(!registry.contains(&id).await);
}

#[tokio::test]
async fn test_expire_unattached() {
    let registry = registry();
    let idle = registry.create(1).await;
    let busy = registry.create(1).await;
    let _attachment = registry.attach(&busy, 1).await.unwrap();

    let none = registry.expire_unattached(Duration::from_secs(3600)).await;
    assert!(none.is_empty());

    let expired = registry.expire_unattached(Duration::ZERO).await;
    assert_eq!(expired, vec![idle.clone()]);
    assert!(!registry.contains(&idle).await);
    assert!(registry.contains(&busy).await);
}

#[tokio::test]
async fn test_expiry_sweeper_stops_on_cancel() {
    let registry = Arc::new(registry());
    let id = registry.create(1).await;

    let cancel = CancellationToken::new();
    let sweeper = Arc::clone(&registry).spawn_expiry_sweeper(
        Duration::ZERO,
        Duration::from_millis(20),
        cancel.clone(),
    );

    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.contains(&id).await {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), sweeper)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_removes_all() {
    let registry = registry();
    for project in 0..3 {
        registry.create(project).await;
    }
    let id = registry.create(10).await;
    let mut attachment = registry.attach(&id, 10).await.unwrap();

    assert_eq!(registry.shutdown().await, 4);
    assert!(registry.is_empty().await);
    assert_ne!(wait_for_exit(&mut attachment.output).await, 0);
}

#[tokio::test]
async fn test_audit_records_lifecycle() {
    let created = Arc::new(AtomicUsize::new(0));
    let closed = Arc::new(AtomicUsize::new(0));

    let mut audit = MockSessionAuditStore::new();
    let c = Arc::clone(&created);
    audit
        .expect_record_created()
        .withf(|project_id, _| *project_id == 11)
        .returning(move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    let c = Arc::clone(&closed);
    audit.expect_record_closed().returning(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let registry = sh_registry(Arc::new(audit));
    let id = registry.create(11).await;
    registry.remove(&id).await;
    registry.remove(&id).await;

    assert_eq!(created.load(Ordering::SeqCst), 1);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_audit_failure_does_not_block_session() {
    let mut audit = MockSessionAuditStore::new();
    audit
        .expect_record_created()
        .returning(|_, _| Err(Error::Audit("database is locked".to_string())));
    audit
        .expect_record_closed()
        .returning(|_| Err(Error::Audit("database is locked".to_string())));
    audit.expect_name().return_const("mock");

    let registry = sh_registry(Arc::new(audit));
    let id = registry.create(1).await;
    assert!(registry.contains(&id).await);
    assert!(registry.attach(&id, 1).await.is_ok());
    assert!(registry.remove(&id).await);
}
