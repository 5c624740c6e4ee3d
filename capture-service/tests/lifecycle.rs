//! End-to-end lifecycle through the worker pool: submit, analyze, observe the
//! terminal status and persisted extraction.

use capture_service::config::WorkerConfig;
use capture_service::models::{Document, DocumentKind, DocumentStatus, PartyRole};
use capture_service::services::repository::DocumentRepository;
use capture_service::services::IngestionService;
use capture_service::testing::{pdf_with_pages, MockAnalysisProvider, MockRepository, MockStorage};
use capture_service::validation::{UploadLimits, PDF_CONTENT_TYPE};
use capture_service::workers::WorkerOrchestrator;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    repository: Arc<MockRepository>,
    storage: Arc<MockStorage>,
    provider: Arc<MockAnalysisProvider>,
    ingestion: IngestionService,
}

async fn harness() -> Harness {
    let repository = Arc::new(MockRepository::new());
    let storage = Arc::new(MockStorage::new());
    let provider = Arc::new(MockAnalysisProvider::new());

    let config = WorkerConfig {
        enabled: true,
        worker_count: 2,
        queue_size: 16,
    };
    let (orchestrator, job_tx) = WorkerOrchestrator::new(
        config,
        repository.clone(),
        storage.clone(),
        provider.clone(),
    );
    orchestrator.start().await;

    let ingestion = IngestionService::new(
        repository.clone(),
        storage.clone(),
        UploadLimits::default(),
        job_tx,
    );

    Harness {
        repository,
        storage,
        provider,
        ingestion,
    }
}

/// Poll until the document leaves `Processing`.
async fn await_terminal(repository: &MockRepository, id: &str) -> Document {
    for _ in 0..200 {
        if let Some(document) = repository.document(id) {
            if document.status.is_terminal() {
                return document;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("document {} never reached a terminal status", id);
}

#[tokio::test]
async fn successful_analysis_persists_fields_items_and_parties() {
    let h = harness().await;

    h.provider.succeed_with(serde_json::json!({
        "fields": {
            "document_number": "INV-2042",
            "vendor_name": "Acme Supplies Ltd",
            "customer_name": "Globex Corp",
            "total": "$1,234.50",
            "subtotal": "1,200.00",
            "tax": "34.50",
            "currency": "USD",
            "payment_terms": "Net 30",
            "due_date": "2025-03-01"
        },
        "line_items": [
            { "description": "Widget", "quantity": "3", "unit": "pcs",
              "unit_price": "400.00", "amount": "1200.00" },
            { "description": "", "quantity": "1" }
        ]
    }));

    let receipt = h
        .ingestion
        .submit(
            pdf_with_pages(2),
            "invoice.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::Invoice,
            "partner-1",
        )
        .await
        .unwrap();

    let document = await_terminal(&h.repository, &receipt.id).await;
    assert_eq!(document.status, DocumentStatus::Analyzed);
    assert!(document.error_message.is_none());

    assert_eq!(document.fields.document_number.as_deref(), Some("INV-2042"));
    assert_eq!(
        document.fields.total_amount,
        Some(Decimal::from_str("1234.50").unwrap())
    );
    assert_eq!(
        document.fields.subtotal_amount,
        Some(Decimal::from_str("1200.00").unwrap())
    );
    assert_eq!(
        document.fields.tax_amount,
        Some(Decimal::from_str("34.50").unwrap())
    );
    assert_eq!(document.fields.currency_code.as_deref(), Some("USD"));
    assert_eq!(document.fields.payment_terms.as_deref(), Some("Net 30"));
    assert_eq!(
        document.fields.due_date.map(|d| d.to_string()),
        Some("2025-03-01".to_string())
    );

    // Raw provider output is archived next to the document.
    let analysis_url = document.analysis_json_url.unwrap();
    let analysis_key = format!("analysis/partner-1/{}.json", receipt.id);
    assert_eq!(analysis_url, format!("mock://{}", analysis_key));
    assert!(h.storage.contains(&analysis_key));

    // The blank-description line was dropped.
    let items = h.repository.items_for(&receipt.id);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].description, "Widget");
    assert_eq!(items[0].quantity, 3);
    assert_eq!(items[0].document_kind, DocumentKind::Invoice);

    // Both parties were resolved and referenced.
    let parties = h.repository.parties();
    assert_eq!(parties.len(), 2);
    assert!(parties
        .iter()
        .any(|p| p.role == PartyRole::Vendor && p.name == "Acme Supplies Ltd"));
    assert!(parties
        .iter()
        .any(|p| p.role == PartyRole::Customer && p.name == "Globex Corp"));
    assert_eq!(
        document.vendor_id,
        parties
            .iter()
            .find(|p| p.role == PartyRole::Vendor)
            .map(|p| p.id.clone())
    );
}

#[tokio::test]
async fn provider_failure_marks_the_document_failed() {
    let h = harness().await;
    h.provider.fail_transient("provider returned 503");

    let receipt = h
        .ingestion
        .submit(
            pdf_with_pages(1),
            "scan.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::PurchaseOrder,
            "partner-1",
        )
        .await
        .unwrap();

    let document = await_terminal(&h.repository, &receipt.id).await;
    assert_eq!(document.status, DocumentStatus::Failed);
    let message = document.error_message.unwrap();
    assert!(message.contains("provider returned 503"));

    // Financial fields stay null and no items exist.
    assert!(document.fields.total_amount.is_none());
    assert!(document.fields.document_number.is_none());
    assert!(h.repository.items_for(&receipt.id).is_empty());

    // No retry: the provider was consulted exactly once.
    assert_eq!(h.provider.calls(), 1);
}

#[tokio::test]
async fn persistence_failure_marks_the_document_failed() {
    let h = harness().await;
    h.repository
        .fail_apply
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let receipt = h
        .ingestion
        .submit(
            pdf_with_pages(1),
            "scan.pdf",
            PDF_CONTENT_TYPE,
            DocumentKind::Invoice,
            "partner-1",
        )
        .await
        .unwrap();

    let document = await_terminal(&h.repository, &receipt.id).await;
    assert_eq!(document.status, DocumentStatus::Failed);
    assert!(document.error_message.is_some());
}

#[tokio::test]
async fn terminal_status_is_written_at_most_once() {
    let repository = MockRepository::new();
    let document = Document::new(
        "partner-1".to_string(),
        DocumentKind::Invoice,
        "scan.pdf".to_string(),
        100,
        "documents/partner-1/a.pdf".to_string(),
        "mock://documents/partner-1/a.pdf".to_string(),
    );
    let id = document.id.clone();
    repository.seed_document(document);

    let first = repository
        .update_status(&id, DocumentStatus::Analyzed, None)
        .await
        .unwrap();
    assert!(first);

    // A later write must not overwrite the terminal state.
    let second = repository
        .update_status(&id, DocumentStatus::Failed, Some("late failure"))
        .await
        .unwrap();
    assert!(!second);

    let document = repository.document(&id).unwrap();
    assert_eq!(document.status, DocumentStatus::Analyzed);
    assert!(document.error_message.is_none());
}
