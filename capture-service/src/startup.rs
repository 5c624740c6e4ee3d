use crate::config::{CaptureConfig, StorageBackend};
use crate::handlers;
use crate::services::{
    DeletionService, HttpAnalysisProvider, IngestionService, LocalStorage, MongoDb,
    MongoRepository, ObjectStorage, S3Storage,
};
use crate::services::analysis::AnalysisProvider;
use crate::services::repository::DocumentRepository;
use crate::workers::WorkerOrchestrator;
use axum::{
    routing::{delete, get, post},
    Router,
};
use service_core::error::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: CaptureConfig,
    pub db: MongoDb,
    pub repository: Arc<dyn DocumentRepository>,
    pub ingestion: Arc<IngestionService>,
    pub deletion: Arc<DeletionService>,
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    state: AppState,
}

impl Application {
    pub async fn build(config: CaptureConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let storage = build_storage(&config).await?;

        let provider: Arc<dyn AnalysisProvider> = Arc::new(
            HttpAnalysisProvider::new(&config.analysis)
                .map_err(AppError::ConfigError)?,
        );

        let repository: Arc<dyn DocumentRepository> = Arc::new(MongoRepository::new(db.clone()));

        let (orchestrator, job_tx) = WorkerOrchestrator::new(
            config.worker.clone(),
            repository.clone(),
            storage.clone(),
            provider,
        );
        tokio::spawn(async move {
            orchestrator.start().await;
        });

        let ingestion = Arc::new(IngestionService::new(
            repository.clone(),
            storage.clone(),
            config.upload.limits(),
            job_tx,
        ));
        let deletion = Arc::new(DeletionService::new(repository.clone(), storage));

        let state = AppState {
            config: config.clone(),
            db,
            repository,
            ingestion,
            deletion,
        };

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            .route("/documents", post(handlers::submit_document))
            .route("/documents/:id/status", get(handlers::get_document_status))
            .route("/documents/:id", delete(handlers::delete_document))
            .layer(TraceLayer::new_for_http())
            .with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router: app,
            state,
        })
    }

    pub fn db(&self) -> &MongoDb {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}

async fn build_storage(config: &CaptureConfig) -> Result<Arc<dyn ObjectStorage>, AppError> {
    match config.storage.backend {
        StorageBackend::Local => {
            let storage = LocalStorage::new(&config.storage.local_path)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        config.storage.local_path,
                        e
                    );
                    e
                })?;
            Ok(Arc::new(storage))
        }
        StorageBackend::S3 => {
            let bucket = config.storage.s3_bucket.clone().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("STORAGE_S3_BUCKET is required for s3"))
            })?;
            let region = config.storage.s3_region.clone().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!("STORAGE_S3_REGION is required for s3"))
            })?;

            let aws_config = aws_config::from_env()
                .region(aws_sdk_s3::config::Region::new(region.clone()))
                .load()
                .await;
            let client = aws_sdk_s3::Client::new(&aws_config);

            Ok(Arc::new(S3Storage::new(client, bucket, region)))
        }
    }
}
