use crate::models::{Document, Item, Party};
use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(uri = %uri, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB at {}: {}", uri, e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for capture-service");

        // Partner-scoped lookups exclude soft-deleted records.
        let partner_index = IndexModel::builder()
            .keys(doc! { "partner_id": 1, "is_deleted": 1 })
            .options(
                IndexOptions::builder()
                    .name("partner_lookup".to_string())
                    .build(),
            )
            .build();
        self.documents()
            .create_index(partner_index, None)
            .await
            .map_err(AppError::from)?;

        // Items are addressed by their owning (kind, document) pair.
        let item_index = IndexModel::builder()
            .keys(doc! { "document_kind": 1, "document_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("document_items".to_string())
                    .build(),
            )
            .build();
        self.items()
            .create_index(item_index, None)
            .await
            .map_err(AppError::from)?;

        // One party per (partner, role, name).
        let party_index = IndexModel::builder()
            .keys(doc! { "partner_id": 1, "role": 1, "name": 1 })
            .options(
                IndexOptions::builder()
                    .name("party_identity".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.parties()
            .create_index(party_index, None)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn documents(&self) -> Collection<Document> {
        self.db.collection("documents")
    }

    pub fn items(&self) -> Collection<Item> {
        self.db.collection("items")
    }

    pub fn parties(&self) -> Collection<Party> {
        self.db.collection("parties")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
