//! Deletion ordering and eligibility: storage artifacts go first, the record
//! goes last, and nothing is removed for an ineligible document.

use capture_service::models::{Document, DocumentKind, DocumentStatus};
use capture_service::services::{DeleteMode, DeletionService, ObjectStorage};
use capture_service::testing::{MockRepository, MockStorage};
use service_core::error::AppError;
use std::sync::atomic::Ordering;
use std::sync::Arc;

struct Harness {
    repository: Arc<MockRepository>,
    storage: Arc<MockStorage>,
    deletion: DeletionService,
}

fn harness() -> Harness {
    let repository = Arc::new(MockRepository::new());
    let storage = Arc::new(MockStorage::new());
    let deletion = DeletionService::new(repository.clone(), storage.clone());
    Harness {
        repository,
        storage,
        deletion,
    }
}

/// Seed an analyzed document with both artifacts present in storage.
async fn seed_analyzed(h: &Harness, partner_id: &str) -> Document {
    let mut document = Document::new(
        partner_id.to_string(),
        DocumentKind::Invoice,
        "scan.pdf".to_string(),
        100,
        format!("documents/{}/a.pdf", partner_id),
        format!("mock://documents/{}/a.pdf", partner_id),
    );
    document.status = DocumentStatus::Analyzed;
    let analysis_key = format!("analysis/{}/{}.json", partner_id, document.id);
    document.analysis_json_url = Some(format!("mock://{}", analysis_key));

    h.storage
        .put(&document.storage_key, b"%PDF-1.5".to_vec())
        .await
        .unwrap();
    h.storage.put(&analysis_key, b"{}".to_vec()).await.unwrap();
    h.storage.put_calls.store(0, Ordering::SeqCst);

    h.repository.seed_document(document.clone());
    document
}

#[tokio::test]
async fn soft_delete_removes_artifacts_and_hides_the_record() {
    let h = harness();
    let document = seed_analyzed(&h, "partner-1").await;

    h.deletion
        .delete("partner-1", &document.id, DeleteMode::Soft)
        .await
        .unwrap();

    assert_eq!(h.storage.delete_calls(), 2);
    assert!(!h.storage.contains(&document.storage_key));

    // The record survives soft deletion but is invisible to lookups.
    let raw = h.repository.document(&document.id).unwrap();
    assert!(raw.is_deleted);
    assert!(raw.deleted_at.is_some());

    let err = h
        .deletion
        .delete("partner-1", &document.id, DeleteMode::Soft)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn purge_removes_the_record_entirely() {
    let h = harness();
    let document = seed_analyzed(&h, "partner-1").await;

    h.deletion
        .delete("partner-1", &document.id, DeleteMode::Purge)
        .await
        .unwrap();

    assert!(h.repository.document(&document.id).is_none());
}

#[tokio::test]
async fn unknown_document_reports_not_found() {
    let h = harness();

    let err = h
        .deletion
        .delete("partner-1", "no-such-id", DeleteMode::Soft)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(h.storage.delete_calls(), 0);
}

#[tokio::test]
async fn foreign_document_is_forbidden_and_untouched() {
    let h = harness();
    let document = seed_analyzed(&h, "partner-1").await;

    let err = h
        .deletion
        .delete("partner-2", &document.id, DeleteMode::Soft)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(h.storage.delete_calls(), 0);
    assert_eq!(h.repository.delete_calls(), 0);
    assert!(h.storage.contains(&document.storage_key));
}

#[tokio::test]
async fn processing_document_cannot_be_deleted() {
    let h = harness();
    let mut document = seed_analyzed(&h, "partner-1").await;
    document.status = DocumentStatus::Processing;
    h.repository.seed_document(document.clone());

    let err = h
        .deletion
        .delete("partner-1", &document.id, DeleteMode::Soft)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(h.storage.delete_calls(), 0);
    assert_eq!(h.repository.delete_calls(), 0);
}

#[tokio::test]
async fn storage_failure_aborts_before_the_record_is_touched() {
    let h = harness();
    let document = seed_analyzed(&h, "partner-1").await;
    h.storage.fail_delete.store(true, Ordering::SeqCst);

    let err = h
        .deletion
        .delete("partner-1", &document.id, DeleteMode::Soft)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InternalError(_)));
    assert_eq!(h.repository.delete_calls(), 0);

    // The record is still live, so the deletion can be retried.
    let raw = h.repository.document(&document.id).unwrap();
    assert!(!raw.is_deleted);

    h.storage.fail_delete.store(false, Ordering::SeqCst);
    h.deletion
        .delete("partner-1", &document.id, DeleteMode::Soft)
        .await
        .unwrap();
    assert!(h.repository.document(&document.id).unwrap().is_deleted);
}
