use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of financial document. Invoices and purchase orders share the same
/// lifecycle and line-item concept but keep separate identifier namespaces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    PurchaseOrder,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::PurchaseOrder => "purchase_order",
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invoice" => Ok(DocumentKind::Invoice),
            "purchase_order" => Ok(DocumentKind::PurchaseOrder),
            _ => Err(format!("Invalid document kind: {}", s)),
        }
    }
}

/// Lifecycle status. `Processing` is entered exactly once at creation and
/// transitions at most once to a terminal state; it never reverts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Analyzed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Processing => "processing",
            DocumentStatus::Analyzed => "analyzed",
            DocumentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DocumentStatus::Processing)
    }
}

/// Normalized financial fields produced by the result mapper. All optional:
/// the analysis provider extracts what it can and the rest stays null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFields {
    pub document_number: Option<String>,
    pub total_amount: Option<Decimal>,
    pub subtotal_amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub currency_code: Option<String>,
    pub payment_terms: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// A scanned financial document and its extraction state.
///
/// Written by exactly three actors: the ingestion orchestrator creates it in
/// `Processing`, the analysis worker moves it once to a terminal state, and
/// the deletion orchestrator soft- or hard-deletes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    pub partner_id: String,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    pub original_filename: String,
    pub file_size: i64,
    pub storage_key: String,
    pub file_url: String,
    pub analysis_json_url: Option<String>,
    #[serde(flatten)]
    pub fields: DocumentFields,
    pub customer_id: Option<String>,
    pub vendor_id: Option<String>,
    pub error_message: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        partner_id: String,
        kind: DocumentKind,
        original_filename: String,
        file_size: i64,
        storage_key: String,
        file_url: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            partner_id,
            kind,
            status: DocumentStatus::Processing,
            original_filename,
            file_size,
            storage_key,
            file_url,
            analysis_json_url: None,
            fields: DocumentFields::default(),
            customer_id: None,
            vendor_id: None,
            error_message: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
