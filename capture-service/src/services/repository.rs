use crate::models::{Document, DocumentFields, DocumentStatus, Item, Party, PartyRole};
use crate::services::database::MongoDb;
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::doc;
use service_core::error::AppError;

/// How a record is removed: the normal path keeps the row and marks it,
/// `Purge` is the administrative override that removes it physically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    Soft,
    Purge,
}

/// Single source of truth for document records.
///
/// Mutated by the ingestion orchestrator (create), the analysis worker
/// (analysis fields + the one terminal status write), and the deletion
/// orchestrator — never concurrently for the same id.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create_initial(&self, document: &Document) -> Result<(), AppError>;

    /// Look up a live document. Soft-deleted records are invisible here, so a
    /// repeated delete observes `None` and reports not-found.
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError>;

    /// Transition a document out of `Processing`. The update is guarded on
    /// the current status, so a terminal state is written at most once;
    /// returns whether the guard matched.
    async fn update_status(
        &self,
        id: &str,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> Result<bool, AppError>;

    /// Persist the mapped financial fields, analysis artifact pointer, and
    /// party references in one logical update.
    async fn apply_analysis(
        &self,
        id: &str,
        fields: &DocumentFields,
        analysis_json_url: &str,
        customer_id: Option<&str>,
        vendor_id: Option<&str>,
    ) -> Result<(), AppError>;

    async fn insert_item(&self, item: &Item) -> Result<(), AppError>;

    /// Remove a document and its items per `mode`.
    async fn delete(&self, id: &str, mode: DeleteMode) -> Result<(), AppError>;

    /// Resolve a party by `(partner, role, name)`, creating it when absent.
    async fn find_or_create_party(
        &self,
        partner_id: &str,
        role: PartyRole,
        name: &str,
    ) -> Result<String, AppError>;
}

#[derive(Clone)]
pub struct MongoRepository {
    db: MongoDb,
}

impl MongoRepository {
    pub fn new(db: MongoDb) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentRepository for MongoRepository {
    async fn create_initial(&self, document: &Document) -> Result<(), AppError> {
        self.db
            .documents()
            .insert_one(document, None)
            .await
            .map_err(|e| {
                tracing::error!(document_id = %document.id, error = %e, "Failed to insert document");
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        let document = self
            .db
            .documents()
            .find_one(doc! { "_id": id, "is_deleted": false }, None)
            .await
            .map_err(AppError::from)?;
        Ok(document)
    }

    async fn update_status(
        &self,
        id: &str,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut set = doc! {
            "status": status.as_str(),
            "updated_at": mongodb::bson::DateTime::from_chrono(Utc::now()),
        };
        if let Some(message) = error_message {
            set.insert("error_message", message);
        }

        // Guard on the current status: a record already in a terminal state
        // never transitions again.
        let result = self
            .db
            .documents()
            .update_one(
                doc! { "_id": id, "status": DocumentStatus::Processing.as_str() },
                doc! { "$set": set },
                None,
            )
            .await
            .map_err(AppError::from)?;

        Ok(result.matched_count > 0)
    }

    async fn apply_analysis(
        &self,
        id: &str,
        fields: &DocumentFields,
        analysis_json_url: &str,
        customer_id: Option<&str>,
        vendor_id: Option<&str>,
    ) -> Result<(), AppError> {
        let mut set = mongodb::bson::to_document(fields).map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to serialize fields: {}", e))
        })?;
        set.insert("analysis_json_url", analysis_json_url);
        if let Some(customer_id) = customer_id {
            set.insert("customer_id", customer_id);
        }
        if let Some(vendor_id) = vendor_id {
            set.insert("vendor_id", vendor_id);
        }
        set.insert(
            "updated_at",
            mongodb::bson::DateTime::from_chrono(Utc::now()),
        );

        self.db
            .documents()
            .update_one(doc! { "_id": id }, doc! { "$set": set }, None)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn insert_item(&self, item: &Item) -> Result<(), AppError> {
        self.db
            .items()
            .insert_one(item, None)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn delete(&self, id: &str, mode: DeleteMode) -> Result<(), AppError> {
        match mode {
            DeleteMode::Soft => {
                self.db
                    .documents()
                    .update_one(
                        doc! { "_id": id },
                        doc! { "$set": {
                            "is_deleted": true,
                            "deleted_at": Utc::now().to_rfc3339(),
                            "updated_at": mongodb::bson::DateTime::from_chrono(Utc::now()),
                        }},
                        None,
                    )
                    .await
                    .map_err(AppError::from)?;
            }
            DeleteMode::Purge => {
                self.db
                    .documents()
                    .delete_one(doc! { "_id": id }, None)
                    .await
                    .map_err(AppError::from)?;
            }
        }

        // Items follow their document in both modes.
        self.db
            .items()
            .delete_many(doc! { "document_id": id }, None)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    async fn find_or_create_party(
        &self,
        partner_id: &str,
        role: PartyRole,
        name: &str,
    ) -> Result<String, AppError> {
        let filter = doc! {
            "partner_id": partner_id,
            "role": role.as_str(),
            "name": name,
        };

        if let Some(existing) = self
            .db
            .parties()
            .find_one(filter, None)
            .await
            .map_err(AppError::from)?
        {
            return Ok(existing.id);
        }

        let party = Party::new(partner_id.to_string(), role, name.to_string());
        self.db
            .parties()
            .insert_one(&party, None)
            .await
            .map_err(AppError::from)?;
        Ok(party.id)
    }
}
