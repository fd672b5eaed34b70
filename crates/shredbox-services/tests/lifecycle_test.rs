//! End-to-end tests for the session lifecycle: ingest, view, retrieve,
//! complete, expire.

mod helpers;

use futures::StreamExt;
use shredbox_core::AppError;
use shredbox_store::SessionStore;

use helpers::harness;

async fn drain(mut stream: shredbox_services::PlaintextStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.expect("stream chunk"));
    }
    out
}

#[tokio::test]
async fn test_end_to_end_lifecycle() {
    let h = harness().await;

    let view = h.sessions.create_session().await.unwrap();
    let code = view.code.clone();
    assert!(view.files.is_empty());

    let staged = h.stage("receipt.pdf", "application/pdf", b"ten bytes!").await;
    let records = h.uploads.ingest(&code, vec![staged]).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].size, 10);

    // the encrypted blob is on disk, the plaintext staging file is not
    let blobs = h.blob_names(&code).await;
    assert_eq!(blobs, vec![format!("{}.enc", records[0].id)]);

    let view = h.sessions.get_session_view(&code).await.unwrap();
    assert_eq!(view.files.len(), 1);
    assert_eq!(view.files[0].name, "receipt.pdf");

    let stream = h.retrieval.retrieve(&code, &records[0].id).await.unwrap();
    assert_eq!(stream.content_type(), "application/pdf");
    assert_eq!(stream.len(), 10);
    let bytes = drain(stream).await;
    assert_eq!(bytes, b"ten bytes!");

    h.sessions.complete_session(&code).await.unwrap();

    let err = h.sessions.get_session_view(&code).await.unwrap_err();
    assert!(matches!(err, AppError::SessionNotFound(_)));
    assert!(tokio::fs::metadata(h.session_dir(&code)).await.is_err());
}

#[tokio::test]
async fn test_code_entry_is_case_insensitive() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();

    let lowered = view.code.to_lowercase();
    let fetched = h.sessions.get_session_view(&lowered).await.unwrap();
    assert_eq!(fetched.code, view.code);
}

#[tokio::test]
async fn test_lookup_errors() {
    let h = harness().await;

    assert!(matches!(
        h.sessions.get_session_view("ZZZZZZ").await,
        Err(AppError::SessionNotFound(_))
    ));
    assert!(matches!(
        h.sessions.get_session_view("not a code").await,
        Err(AppError::InvalidCode(_))
    ));

    let view = h.sessions.create_session().await.unwrap();
    assert!(matches!(
        h.retrieval.retrieve(&view.code, "123_nothere0").await,
        Err(AppError::FileNotFound(_))
    ));
}

#[tokio::test]
async fn test_rejected_upload_leaves_no_trace() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();

    let staged = h
        .stage("payload.exe", "application/x-msdownload", b"MZ\x90\x00")
        .await;
    let staged_path = staged.path.clone();

    let err = h.uploads.ingest(&view.code, vec![staged]).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(err.to_string().contains("payload.exe"));

    // no ciphertext, no lingering plaintext, no record entry
    assert!(h.blob_names(&view.code).await.is_empty());
    assert!(tokio::fs::metadata(&staged_path).await.is_err());
    let view = h.sessions.get_session_view(&view.code).await.unwrap();
    assert!(view.files.is_empty());
}

#[tokio::test]
async fn test_batch_aborts_and_erases_partial_outputs() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();

    let good = h.stage("first.pdf", "application/pdf", b"fine").await;
    let bad = h
        .stage("second.exe", "application/x-msdownload", b"nope")
        .await;
    let good_path = good.path.clone();
    let bad_path = bad.path.clone();

    let err = h
        .uploads
        .ingest(&view.code, vec![good, bad])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("second.exe"));

    // the first file had already been encrypted; the abort erased it again
    assert!(h.blob_names(&view.code).await.is_empty());
    assert!(tokio::fs::metadata(&good_path).await.is_err());
    assert!(tokio::fs::metadata(&bad_path).await.is_err());

    let view = h.sessions.get_session_view(&view.code).await.unwrap();
    assert!(view.files.is_empty());
}

#[tokio::test]
async fn test_concurrent_ingests_lose_no_update() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();
    let code = view.code.clone();

    let a = h.stage("a.pdf", "application/pdf", b"first file").await;
    let b = h.stage("b.pdf", "application/pdf", b"second file").await;

    let (ra, rb) = tokio::join!(
        h.uploads.ingest(&code, vec![a]),
        h.uploads.ingest(&code, vec![b]),
    );
    ra.unwrap();
    rb.unwrap();

    let view = h.sessions.get_session_view(&code).await.unwrap();
    assert_eq!(view.files.len(), 2);
    assert_eq!(h.blob_names(&code).await.len(), 2);
}

#[tokio::test]
async fn test_batch_cap_enforced() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();

    let mut batch = Vec::new();
    for i in 0..11 {
        batch.push(
            h.stage(&format!("f{i}.pdf"), "application/pdf", b"x")
                .await,
        );
    }
    let err = h.uploads.ingest(&view.code, batch).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(h.blob_names(&view.code).await.is_empty());
}

#[tokio::test]
async fn test_expired_session_self_heals_without_sweeper() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();
    let code = view.code.clone();

    let staged = h.stage("doc.pdf", "application/pdf", b"sensitive").await;
    h.uploads.ingest(&code, vec![staged]).await.unwrap();
    assert_eq!(h.blob_names(&code).await.len(), 1);

    h.backdate_past_ttl(&code).await;

    assert!(matches!(
        h.sessions.get_session_view(&code).await,
        Err(AppError::SessionNotFound(_))
    ));
    // no ciphertext survives under the session directory
    assert!(tokio::fs::metadata(h.session_dir(&code)).await.is_err());
    assert!(h.store.get(&code).await.unwrap().is_none());
}

#[tokio::test]
async fn test_corrupt_blob_is_surfaced_and_kept() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();
    let code = view.code.clone();

    let staged = h.stage("doc.pdf", "application/pdf", b"important bytes").await;
    let records = h.uploads.ingest(&code, vec![staged]).await.unwrap();

    // truncate the blob mid-block
    let blob = h.session_dir(&code).join(format!("{}.enc", records[0].id));
    let data = tokio::fs::read(&blob).await.unwrap();
    tokio::fs::write(&blob, &data[..data.len() - 5]).await.unwrap();

    let err = h.retrieval.retrieve(&code, &records[0].id).await.unwrap_err();
    assert!(matches!(err, AppError::CorruptCiphertext(_)));

    // the blob is left in place for inspection, and no spool file leaks
    assert!(tokio::fs::metadata(&blob).await.is_ok());
    assert!(h.spool_files().await.is_empty());
}

#[tokio::test]
async fn test_dropped_stream_still_erases_spool() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();
    let code = view.code.clone();

    let payload = vec![0x5Au8; 256 * 1024];
    let staged = h.stage("big.pdf", "application/pdf", &payload).await;
    let records = h.uploads.ingest(&code, vec![staged]).await.unwrap();

    let mut stream = h.retrieval.retrieve(&code, &records[0].id).await.unwrap();
    assert_eq!(h.spool_files().await.len(), 1);

    // client reads one chunk and disconnects
    let first = stream.next().await.expect("first chunk").unwrap();
    assert!(!first.is_empty());
    drop(stream);

    // the drop guard erases on the runtime; give it a beat
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(h.spool_files().await.is_empty());

    // the encrypted blob is untouched and can be retrieved again
    let again = h.retrieval.retrieve(&code, &records[0].id).await.unwrap();
    let bytes = drain(again).await;
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(bytes, payload);
    assert!(h.spool_files().await.is_empty());
}

#[tokio::test]
async fn test_view_exposes_no_key_material() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();
    let code = view.code.clone();

    let staged = h.stage("doc.pdf", "application/pdf", b"secret").await;
    h.uploads.ingest(&code, vec![staged]).await.unwrap();

    // the stored record carries the key; the client-facing view never does
    assert!(h.store.get(&code).await.unwrap().unwrap().key.is_some());
    let view = h.sessions.get_session_view(&code).await.unwrap();
    let json = serde_json::to_string(&view).unwrap();
    assert!(!json.contains("key"));
    assert!(!json.contains(&helpers::test_key_hex()));
}

#[tokio::test]
async fn test_second_completion_reports_gone() {
    let h = harness().await;
    let view = h.sessions.create_session().await.unwrap();

    h.sessions.complete_session(&view.code).await.unwrap();
    assert!(matches!(
        h.sessions.complete_session(&view.code).await,
        Err(AppError::SessionNotFound(_))
    ));
}
