use crate::models::{Document, DocumentKind, DocumentStatus};
use crate::services::ingestion::SubmitReceipt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SubmitParams {
    pub kind: Option<DocumentKind>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub id: String,
    pub status: DocumentStatus,
}

impl From<SubmitReceipt> for SubmitResponse {
    fn from(receipt: SubmitReceipt) -> Self {
        Self {
            id: receipt.id,
            status: receipt.status,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub id: String,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<Document> for StatusResponse {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            kind: doc.kind,
            status: doc.status,
            error_message: doc.error_message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub purge: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}
