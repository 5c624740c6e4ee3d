//! Ingestion orchestrator: the synchronous half of the document lifecycle.

use crate::models::{Document, DocumentKind, DocumentStatus};
use crate::services::repository::DocumentRepository;
use crate::services::storage::ObjectStorage;
use crate::validation::{validate_upload, UploadLimits};
use crate::workers::AnalysisJob;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// What the caller gets back immediately: the new id, always in
/// `Processing`. Terminal state is observed by polling the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub id: String,
    pub status: DocumentStatus,
}

pub struct IngestionService {
    repository: Arc<dyn DocumentRepository>,
    storage: Arc<dyn ObjectStorage>,
    limits: UploadLimits,
    job_tx: mpsc::Sender<AnalysisJob>,
}

impl IngestionService {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        storage: Arc<dyn ObjectStorage>,
        limits: UploadLimits,
        job_tx: mpsc::Sender<AnalysisJob>,
    ) -> Self {
        Self {
            repository,
            storage,
            limits,
            job_tx,
        }
    }

    /// Validate, store, create the record, hand off to the analysis workers.
    ///
    /// Each step is a hard precondition for the next: the record is only
    /// created once the artifact is stored, and a job is only enqueued once
    /// the record exists — so a failed creation never leaves orphaned async
    /// work behind.
    pub async fn submit(
        &self,
        data: Vec<u8>,
        filename: &str,
        content_type: &str,
        kind: DocumentKind,
        partner_id: &str,
    ) -> Result<SubmitReceipt, AppError> {
        if partner_id.trim().is_empty() {
            return Err(AppError::AuthError(anyhow::anyhow!(
                "Missing partner identity"
            )));
        }
        if data.is_empty() {
            return Err(AppError::ValidationError(anyhow::anyhow!(
                "No file content provided"
            )));
        }
        if filename.trim().is_empty() {
            return Err(AppError::ValidationError(anyhow::anyhow!(
                "Filename is required"
            )));
        }

        let report = validate_upload(&data, content_type, filename, &self.limits)?;
        if report.encrypted {
            // Policy: no password-gated decryption flow.
            return Err(AppError::ValidationError(anyhow::anyhow!(
                "Encrypted PDF is not supported"
            )));
        }

        metrics::counter!("document_submissions_total", "kind" => kind.as_str()).increment(1);

        let file_size = data.len() as i64;
        let storage_key = format!("documents/{}/{}.pdf", partner_id, Uuid::new_v4());

        let file_url = self.storage.put(&storage_key, data).await.map_err(|e| {
            tracing::error!(storage_key = %storage_key, error = %e, "Failed to store upload");
            e
        })?;

        let document = Document::new(
            partner_id.to_string(),
            kind,
            filename.to_string(),
            file_size,
            storage_key.clone(),
            file_url,
        );

        tracing::info!(
            document_id = %document.id,
            filename = %document.original_filename,
            size = file_size,
            pages = report.page_count,
            "Document submission accepted"
        );

        self.repository.create_initial(&document).await?;

        let job = AnalysisJob {
            document_id: document.id.clone(),
            partner_id: document.partner_id.clone(),
            kind,
            storage_key,
        };

        self.job_tx.try_send(job).map_err(|_| {
            tracing::error!(document_id = %document.id, "Failed to enqueue analysis job");
            AppError::InternalError(anyhow::anyhow!("Analysis queue is full"))
        })?;

        Ok(SubmitReceipt {
            id: document.id,
            status: document.status,
        })
    }
}
