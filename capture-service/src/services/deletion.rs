//! Deletion orchestrator.
//!
//! Plain sequential steps with short-circuit-on-error: eligibility checks,
//! then storage artifacts, then the record. Storage deletion always happens
//! before record deletion, so a half-finished attempt leaves a record that a
//! retry can still find — never an unreachable orphaned artifact.

use crate::models::DocumentStatus;
use crate::services::repository::{DeleteMode, DocumentRepository};
use crate::services::storage::ObjectStorage;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub message: String,
}

pub struct DeletionService {
    repository: Arc<dyn DocumentRepository>,
    storage: Arc<dyn ObjectStorage>,
}

impl DeletionService {
    pub fn new(repository: Arc<dyn DocumentRepository>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            repository,
            storage,
        }
    }

    /// Delete a document and its stored artifacts.
    ///
    /// Steps 1-3 are idempotent checks, so retrying after any failure is
    /// safe; retrying after success reports not-found.
    pub async fn delete(
        &self,
        partner_id: &str,
        document_id: &str,
        mode: DeleteMode,
    ) -> Result<DeleteOutcome, AppError> {
        let document = self
            .repository
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;

        if document.partner_id != partner_id {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "Document belongs to a different partner"
            )));
        }

        if document.status != DocumentStatus::Analyzed {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Document cannot be deleted unless it is Analyzed"
            )));
        }

        if !document.file_url.is_empty() {
            self.delete_artifact(&document.file_url).await?;
        }
        if let Some(analysis_url) = &document.analysis_json_url {
            self.delete_artifact(analysis_url).await?;
        }

        self.repository.delete(document_id, mode).await?;

        metrics::counter!("document_deletions_total", "mode" => match mode {
            DeleteMode::Soft => "soft",
            DeleteMode::Purge => "purge",
        })
        .increment(1);

        tracing::info!(
            document_id = %document_id,
            partner_id = %partner_id,
            ?mode,
            "Document deleted"
        );

        Ok(DeleteOutcome {
            message: "Document deleted".to_string(),
        })
    }

    async fn delete_artifact(&self, url: &str) -> Result<(), AppError> {
        let key = self.storage.key_for_url(url).ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Could not derive a storage key from {}",
                url
            ))
        })?;

        self.storage.delete(&key).await.map_err(|e| {
            tracing::error!(key = %key, error = %e, "Storage deletion failed");
            AppError::InternalError(anyhow::anyhow!("Storage deletion failed: {}", e))
        })
    }
}
