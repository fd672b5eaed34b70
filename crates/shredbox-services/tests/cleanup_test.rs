//! Tests for the expiry sweeper.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use shredbox_services::CleanupService;
use shredbox_store::SessionStore;

use helpers::harness;

#[tokio::test]
async fn test_sweep_expires_stale_sessions() {
    let h = harness().await;

    let stale = h.sessions.create_session().await.unwrap();
    let staged = h.stage("doc.pdf", "application/pdf", b"old data").await;
    h.uploads.ingest(&stale.code, vec![staged]).await.unwrap();
    h.backdate_past_ttl(&stale.code).await;

    let live = h.sessions.create_session().await.unwrap();

    let cleanup = CleanupService::new(h.repository.clone(), Duration::from_secs(1800));
    cleanup.sweep().await.unwrap();

    assert!(h.store.get(&stale.code).await.unwrap().is_none());
    assert!(tokio::fs::metadata(h.session_dir(&stale.code)).await.is_err());
    assert!(h.store.get(&live.code).await.unwrap().is_some());
}

#[tokio::test]
async fn test_sweep_removes_orphan_directories() {
    let h = harness().await;

    // a directory with blobs but no record, as a crash would leave behind
    let orphan = h.session_dir("QQ99QQ");
    tokio::fs::create_dir_all(&orphan).await.unwrap();
    tokio::fs::write(orphan.join("123_abcdefghi.enc"), vec![1u8; 512])
        .await
        .unwrap();

    let live = h.sessions.create_session().await.unwrap();
    let staged = h.stage("keep.pdf", "application/pdf", b"keep me").await;
    h.uploads.ingest(&live.code, vec![staged]).await.unwrap();

    let cleanup = CleanupService::new(h.repository.clone(), Duration::from_secs(1800));
    cleanup.sweep().await.unwrap();

    assert!(tokio::fs::metadata(&orphan).await.is_err());
    assert_eq!(h.blob_names(&live.code).await.len(), 1);
}

#[tokio::test]
async fn test_background_task_sweeps_on_interval() {
    let h = harness().await;

    let stale = h.sessions.create_session().await.unwrap();
    h.backdate_past_ttl(&stale.code).await;

    let cleanup = Arc::new(CleanupService::new(
        h.repository.clone(),
        Duration::from_millis(50),
    ));
    let handle = cleanup.start();

    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.abort();

    assert!(h.store.get(&stale.code).await.unwrap().is_none());
}
