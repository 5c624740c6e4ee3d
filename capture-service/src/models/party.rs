use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role a party plays relative to the document owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Customer,
    Vendor,
}

impl PartyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyRole::Customer => "customer",
            PartyRole::Vendor => "vendor",
        }
    }
}

/// A customer or vendor resolved from mapped extraction data, scoped to the
/// owning partner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Party {
    #[serde(rename = "_id")]
    pub id: String,
    pub partner_id: String,
    pub role: PartyRole,
    pub name: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Party {
    pub fn new(partner_id: String, role: PartyRole, name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            partner_id,
            role,
            name,
            created_at: Utc::now(),
        }
    }
}
