use crate::models::{Document, DocumentFields, DocumentStatus, Item, Party, PartyRole};
use crate::services::repository::{DeleteMode, DocumentRepository};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory `DocumentRepository` with the same guarded status transition as
/// the Mongo-backed implementation.
#[derive(Default)]
pub struct MockRepository {
    documents: Mutex<HashMap<String, Document>>,
    items: Mutex<Vec<Item>>,
    parties: Mutex<Vec<Party>>,
    pub fail_create: AtomicBool,
    pub fail_apply: AtomicBool,
    pub fail_insert_item: AtomicBool,
    pub fail_party: AtomicBool,
    pub delete_calls: AtomicUsize,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lookup that sees soft-deleted records too.
    pub fn document(&self, id: &str) -> Option<Document> {
        self.documents.lock().unwrap().get(id).cloned()
    }

    pub fn items_for(&self, document_id: &str) -> Vec<Item> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.document_id == document_id)
            .cloned()
            .collect()
    }

    pub fn parties(&self) -> Vec<Party> {
        self.parties.lock().unwrap().clone()
    }

    pub fn seed_document(&self, document: Document) {
        self.documents
            .lock()
            .unwrap()
            .insert(document.id.clone(), document);
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentRepository for MockRepository {
    async fn create_initial(&self, document: &Document) -> Result<(), AppError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "simulated insert failure"
            )));
        }
        self.documents
            .lock()
            .unwrap()
            .insert(document.id.clone(), document.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        let documents = self.documents.lock().unwrap();
        Ok(documents.get(id).filter(|d| !d.is_deleted).cloned())
    }

    async fn update_status(
        &self,
        id: &str,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut documents = self.documents.lock().unwrap();
        match documents.get_mut(id) {
            Some(document) if document.status == DocumentStatus::Processing => {
                document.status = status;
                if let Some(message) = error_message {
                    document.error_message = Some(message.to_string());
                }
                document.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn apply_analysis(
        &self,
        id: &str,
        fields: &DocumentFields,
        analysis_json_url: &str,
        customer_id: Option<&str>,
        vendor_id: Option<&str>,
    ) -> Result<(), AppError> {
        if self.fail_apply.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "simulated update failure"
            )));
        }
        let mut documents = self.documents.lock().unwrap();
        if let Some(document) = documents.get_mut(id) {
            document.fields = fields.clone();
            document.analysis_json_url = Some(analysis_json_url.to_string());
            document.customer_id = customer_id.map(str::to_string);
            document.vendor_id = vendor_id.map(str::to_string);
            document.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_item(&self, item: &Item) -> Result<(), AppError> {
        if self.fail_insert_item.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "simulated item insert failure"
            )));
        }
        self.items.lock().unwrap().push(item.clone());
        Ok(())
    }

    async fn delete(&self, id: &str, mode: DeleteMode) -> Result<(), AppError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut documents = self.documents.lock().unwrap();
        match mode {
            DeleteMode::Soft => {
                if let Some(document) = documents.get_mut(id) {
                    document.is_deleted = true;
                    document.deleted_at = Some(Utc::now());
                    document.updated_at = Utc::now();
                }
            }
            DeleteMode::Purge => {
                documents.remove(id);
            }
        }
        self.items
            .lock()
            .unwrap()
            .retain(|item| item.document_id != id);
        Ok(())
    }

    async fn find_or_create_party(
        &self,
        partner_id: &str,
        role: PartyRole,
        name: &str,
    ) -> Result<String, AppError> {
        if self.fail_party.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "simulated party lookup failure"
            )));
        }
        let mut parties = self.parties.lock().unwrap();
        if let Some(existing) = parties
            .iter()
            .find(|p| p.partner_id == partner_id && p.role == role && p.name == name)
        {
            return Ok(existing.id.clone());
        }
        let party = Party::new(partner_id.to_string(), role, name.to_string());
        let id = party.id.clone();
        parties.push(party);
        Ok(id)
    }
}
