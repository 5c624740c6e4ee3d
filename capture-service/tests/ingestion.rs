//! Ingestion gate behavior: what a submission must pass before any state is
//! created, and what state exists after acceptance.

use capture_service::models::{DocumentKind, DocumentStatus};
use capture_service::services::IngestionService;
use capture_service::testing::{pdf_with_pages, MockRepository, MockStorage};
use capture_service::validation::{UploadLimits, PDF_CONTENT_TYPE};
use capture_service::workers::AnalysisJob;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::mpsc;

fn ingestion(
    repository: Arc<MockRepository>,
    storage: Arc<MockStorage>,
    queue_size: usize,
) -> (IngestionService, mpsc::Receiver<AnalysisJob>) {
    let (job_tx, job_rx) = mpsc::channel(queue_size);
    let service = IngestionService::new(repository, storage, UploadLimits::default(), job_tx);
    (service, job_rx)
}

#[tokio::test]
async fn accepted_submission_stores_creates_and_enqueues() {
    let repository = Arc::new(MockRepository::new());
    let storage = Arc::new(MockStorage::new());
    let (service, mut job_rx) = ingestion(repository.clone(), storage.clone(), 8);

    let receipt = service
        .submit(
            pdf_with_pages(2),
            "invoice-march.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::Invoice,
            "partner-1",
        )
        .await
        .unwrap();

    assert_eq!(receipt.status, DocumentStatus::Processing);

    let document = repository.document(&receipt.id).unwrap();
    assert_eq!(document.status, DocumentStatus::Processing);
    assert_eq!(document.partner_id, "partner-1");
    assert_eq!(document.original_filename, "invoice-march.pdf");
    assert!(document.storage_key.starts_with("documents/partner-1/"));
    assert!(storage.contains(&document.storage_key));

    let job = job_rx.try_recv().unwrap();
    assert_eq!(job.document_id, receipt.id);
    assert_eq!(job.storage_key, document.storage_key);
    assert_eq!(job.kind, DocumentKind::Invoice);
}

#[tokio::test]
async fn oversized_upload_is_rejected_before_any_side_effect() {
    let repository = Arc::new(MockRepository::new());
    let storage = Arc::new(MockStorage::new());
    let (service, mut job_rx) = ingestion(repository.clone(), storage.clone(), 8);

    let mut data = b"%PDF-".to_vec();
    data.resize(21 * 1024 * 1024, 0);

    let err = service
        .submit(
            data,
            "big.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::Invoice,
            "partner-1",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::PayloadTooLarge(_)));
    assert_eq!(storage.put_calls(), 0);
    assert!(job_rx.try_recv().is_err());
}

#[tokio::test]
async fn non_pdf_body_is_rejected_before_any_side_effect() {
    let repository = Arc::new(MockRepository::new());
    let storage = Arc::new(MockStorage::new());
    let (service, mut job_rx) = ingestion(repository.clone(), storage.clone(), 8);

    let err = service
        .submit(
            b"<html>not a pdf</html>".to_vec(),
            "scan.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::PurchaseOrder,
            "partner-1",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    assert_eq!(storage.put_calls(), 0);
    assert!(job_rx.try_recv().is_err());
}

#[tokio::test]
async fn encrypted_pdf_is_rejected() {
    let repository = Arc::new(MockRepository::new());
    let storage = Arc::new(MockStorage::new());
    let (service, _job_rx) = ingestion(repository, storage.clone(), 8);

    let mut data = pdf_with_pages(1);
    data.extend_from_slice(b"trailer << /Encrypt 9 0 R >>");

    let err = service
        .submit(
            data,
            "locked.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::Invoice,
            "partner-1",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(storage.put_calls(), 0);
}

#[tokio::test]
async fn blank_partner_identity_is_unauthorized() {
    let repository = Arc::new(MockRepository::new());
    let storage = Arc::new(MockStorage::new());
    let (service, _job_rx) = ingestion(repository, storage, 8);

    let err = service
        .submit(
            pdf_with_pages(1),
            "scan.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::Invoice,
            "  ",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AuthError(_)));
}

#[tokio::test]
async fn storage_failure_creates_no_record() {
    let repository = Arc::new(MockRepository::new());
    let storage = Arc::new(MockStorage::new());
    storage
        .fail_put
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let (service, mut job_rx) = ingestion(repository.clone(), storage, 8);

    let err = service
        .submit(
            pdf_with_pages(1),
            "scan.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::Invoice,
            "partner-1",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InternalError(_)));
    assert!(job_rx.try_recv().is_err());
}

#[tokio::test]
async fn full_queue_surfaces_an_internal_error() {
    let repository = Arc::new(MockRepository::new());
    let storage = Arc::new(MockStorage::new());
    let (service, mut job_rx) = ingestion(repository.clone(), storage, 1);

    service
        .submit(
            pdf_with_pages(1),
            "first.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::Invoice,
            "partner-1",
        )
        .await
        .unwrap();

    // Queue capacity is 1 and nothing is draining it.
    let err = service
        .submit(
            pdf_with_pages(1),
            "second.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::Invoice,
            "partner-1",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InternalError(_)));
    assert!(job_rx.try_recv().is_ok());
    assert!(job_rx.try_recv().is_err());
}
