pub mod analysis;
pub mod database;
pub mod deletion;
pub mod ingestion;
pub mod mapper;
pub mod repository;
pub mod storage;

pub use analysis::{AnalysisError, AnalysisProvider, ExtractionResult, HttpAnalysisProvider};
pub use database::MongoDb;
pub use deletion::{DeleteOutcome, DeletionService};
pub use ingestion::{IngestionService, SubmitReceipt};
pub use mapper::{map_extraction, MappedDocument};
pub use repository::{DeleteMode, DocumentRepository, MongoRepository};
pub use storage::{LocalStorage, ObjectStorage, S3Storage};
