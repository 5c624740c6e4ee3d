use crate::models::DocumentKind;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A line entry on a financial document.
///
/// Associated to exactly one document via the `(document_kind, document_id)`
/// pair: both document kinds share the item concept without sharing an
/// identity space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id")]
    pub id: String,
    pub document_kind: DocumentKind,
    pub document_id: String,
    pub description: String,
    pub quantity: i64,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub amount: Option<Decimal>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn from_draft(kind: DocumentKind, document_id: &str, draft: ItemDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            document_kind: kind,
            document_id: document_id.to_string(),
            description: draft.description,
            quantity: draft.quantity,
            unit: draft.unit,
            unit_price: draft.unit_price,
            amount: draft.amount,
            created_at: Utc::now(),
        }
    }
}

/// A mapped line item not yet associated to a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub description: String,
    pub quantity: i64,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub amount: Option<Decimal>,
}
