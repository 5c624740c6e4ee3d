use crate::dtos::{DeleteParams, DeleteResponse, StatusResponse, SubmitParams, SubmitResponse};
use crate::middleware::partner::PartnerId;
use crate::models::DocumentKind;
use crate::services::repository::DeleteMode;
use crate::startup::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

/// Accept a scanned document for ingestion.
///
/// The synchronous portion (validation, storage upload, record creation,
/// job handoff) is bounded by the configured submit timeout; an expiry means
/// "unknown outcome, poll status", since the storage write may still land.
pub async fn submit_document(
    State(state): State<AppState>,
    partner_id: PartnerId,
    Query(params): Query<SubmitParams>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            AppError::ValidationError(anyhow::anyhow!("Failed to read multipart field: {}", e))
        })?
        .ok_or_else(|| AppError::ValidationError(anyhow::anyhow!("No file uploaded")))?;

    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| {
            AppError::ValidationError(anyhow::anyhow!("Failed to read file bytes: {}", e))
        })?
        .to_vec();

    let kind = params.kind.unwrap_or(DocumentKind::Invoice);

    let receipt = tokio::time::timeout(
        state.config.upload.submit_timeout(),
        state
            .ingestion
            .submit(data, &filename, &content_type, kind, &partner_id.0),
    )
    .await
    .map_err(|_| {
        tracing::error!(
            filename = %filename,
            "Submission exceeded the synchronous timeout"
        );
        AppError::Timeout(anyhow::anyhow!("Submission timed out"))
    })??;

    Ok((StatusCode::CREATED, Json(SubmitResponse::from(receipt))))
}

pub async fn get_document_status(
    State(state): State<AppState>,
    partner_id: PartnerId,
    Path(document_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let document = state
        .repository
        .find_by_id(&document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Document not found")))?;

    if document.partner_id != partner_id.0 {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Document belongs to a different partner"
        )));
    }

    Ok(Json(StatusResponse::from(document)))
}

pub async fn delete_document(
    State(state): State<AppState>,
    partner_id: PartnerId,
    Path(document_id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<impl IntoResponse, AppError> {
    // Soft delete is the normal path; purge is the administrative override.
    let mode = if params.purge.unwrap_or(false) {
        DeleteMode::Purge
    } else {
        DeleteMode::Soft
    };

    let outcome = state
        .deletion
        .delete(&partner_id.0, &document_id, mode)
        .await?;

    Ok(Json(DeleteResponse {
        message: outcome.message,
    }))
}
