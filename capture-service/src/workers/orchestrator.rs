//! Analysis worker pool: the detached continuation of a submission.
//!
//! Exactly one job is enqueued per document id, so no two workers ever race
//! to write the same record. Provider failures never escape a worker; they
//! only ever manifest as the document's terminal `Failed` status.

use crate::config::WorkerConfig;
use crate::models::{DocumentKind, DocumentStatus, Item, PartyRole};
use crate::services::analysis::AnalysisProvider;
use crate::services::mapper::map_extraction;
use crate::services::repository::DocumentRepository;
use crate::services::storage::ObjectStorage;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub document_id: String,
    pub partner_id: String,
    pub kind: DocumentKind,
    pub storage_key: String,
}

pub struct WorkerOrchestrator {
    config: WorkerConfig,
    repository: Arc<dyn DocumentRepository>,
    storage: Arc<dyn ObjectStorage>,
    provider: Arc<dyn AnalysisProvider>,
    job_rx: Option<mpsc::Receiver<AnalysisJob>>,
    shutdown_token: CancellationToken,
}

impl WorkerOrchestrator {
    pub fn new(
        config: WorkerConfig,
        repository: Arc<dyn DocumentRepository>,
        storage: Arc<dyn ObjectStorage>,
        provider: Arc<dyn AnalysisProvider>,
    ) -> (Self, mpsc::Sender<AnalysisJob>) {
        let (job_tx, job_rx) = mpsc::channel(config.queue_size);
        let shutdown_token = CancellationToken::new();

        let orchestrator = Self {
            config,
            repository,
            storage,
            provider,
            job_rx: Some(job_rx),
            shutdown_token,
        };

        (orchestrator, job_tx)
    }

    pub async fn start(mut self) {
        if !self.config.enabled {
            tracing::info!("Analysis worker pool disabled by configuration");
            return;
        }

        let mut job_rx = self.job_rx.take().expect("start() can only be called once");

        tracing::info!(
            worker_count = self.config.worker_count,
            "Starting analysis worker pool"
        );

        let mut workers = Vec::new();
        for worker_id in 0..self.config.worker_count {
            workers.push(Worker {
                id: worker_id,
                repository: self.repository.clone(),
                storage: self.storage.clone(),
                provider: self.provider.clone(),
            });
        }

        let shutdown = self.shutdown_token.clone();

        tokio::spawn(async move {
            let mut next_worker = 0;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::info!("Job distributor shutting down");
                        break;
                    }
                    job = job_rx.recv() => {
                        match job {
                            Some(job) => {
                                // Round-robin distribution
                                let worker = workers[next_worker].clone();
                                next_worker = (next_worker + 1) % workers.len();

                                tracing::info!(
                                    worker_id = worker.id,
                                    document_id = %job.document_id,
                                    "Dispatching analysis job"
                                );

                                tokio::spawn(async move {
                                    worker.process_job(job).await;
                                });
                            }
                            None => {
                                tracing::info!("Channel closed, job distributor exiting");
                                break;
                            }
                        }
                    }
                }
            }
        });
    }

    pub async fn shutdown(&self) {
        tracing::info!("Initiating analysis worker pool shutdown");
        self.shutdown_token.cancel();
    }
}

#[derive(Clone)]
struct Worker {
    id: usize,
    repository: Arc<dyn DocumentRepository>,
    storage: Arc<dyn ObjectStorage>,
    provider: Arc<dyn AnalysisProvider>,
}

impl Worker {
    /// Run a job to its terminal state. Every code path ends in exactly one
    /// status write, so a document never stays stuck in `Processing`.
    async fn process_job(&self, job: AnalysisJob) {
        let start = Instant::now();

        tracing::info!(
            worker_id = self.id,
            document_id = %job.document_id,
            kind = job.kind.as_str(),
            "Analysis started"
        );

        metrics::counter!("document_analysis_total", "kind" => job.kind.as_str()).increment(1);

        match self.run_analysis(&job).await {
            Ok(()) => {
                self.finish(&job, DocumentStatus::Analyzed, None).await;

                metrics::counter!("document_analysis_success", "kind" => job.kind.as_str())
                    .increment(1);
                metrics::histogram!("document_analysis_duration", "kind" => job.kind.as_str())
                    .record(start.elapsed().as_secs_f64());

                tracing::info!(
                    worker_id = self.id,
                    document_id = %job.document_id,
                    duration_ms = start.elapsed().as_millis(),
                    "Analysis succeeded"
                );
            }
            Err(e) => {
                // No automatic retry: a failed analysis is terminal and
                // resubmission is the only recovery path.
                self.finish(&job, DocumentStatus::Failed, Some(&e.to_string()))
                    .await;

                metrics::counter!("document_analysis_failed", "kind" => job.kind.as_str())
                    .increment(1);

                tracing::warn!(
                    worker_id = self.id,
                    document_id = %job.document_id,
                    error = %e,
                    "Analysis failed"
                );
            }
        }
    }

    async fn run_analysis(&self, job: &AnalysisJob) -> Result<(), AppError> {
        let data = self.storage.get(&job.storage_key).await?;

        let extraction = self
            .provider
            .analyze(&data)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("{}", e)))?;

        // Archive the untouched provider output next to the document.
        let raw_json = serde_json::to_vec(&extraction.raw).map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Failed to serialize analysis output: {}", e))
        })?;
        let analysis_key = format!("analysis/{}/{}.json", job.partner_id, job.document_id);
        let analysis_json_url = self.storage.put(&analysis_key, raw_json).await?;

        let mapped = map_extraction(&extraction);

        // Party resolution is best-effort: a miss leaves the reference null.
        let customer_id = match &mapped.customer_name {
            Some(name) => self.resolve_party(job, PartyRole::Customer, name).await,
            None => None,
        };
        let vendor_id = match &mapped.vendor_name {
            Some(name) => self.resolve_party(job, PartyRole::Vendor, name).await,
            None => None,
        };

        self.repository
            .apply_analysis(
                &job.document_id,
                &mapped.fields,
                &analysis_json_url,
                customer_id.as_deref(),
                vendor_id.as_deref(),
            )
            .await?;

        // Items land before the status flip, so deletion (which requires a
        // terminal status) can never interleave with item persistence.
        for draft in mapped.items {
            let item = Item::from_draft(job.kind, &job.document_id, draft);
            self.repository.insert_item(&item).await?;
        }

        Ok(())
    }

    async fn resolve_party(
        &self,
        job: &AnalysisJob,
        role: PartyRole,
        name: &str,
    ) -> Option<String> {
        match self
            .repository
            .find_or_create_party(&job.partner_id, role, name)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    document_id = %job.document_id,
                    role = role.as_str(),
                    error = %e,
                    "Party resolution failed; leaving reference unset"
                );
                None
            }
        }
    }

    async fn finish(&self, job: &AnalysisJob, status: DocumentStatus, error_message: Option<&str>) {
        match self
            .repository
            .update_status(&job.document_id, status, error_message)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    document_id = %job.document_id,
                    status = status.as_str(),
                    "Document already in a terminal state; status write skipped"
                );
            }
            Err(e) => {
                tracing::error!(
                    document_id = %job.document_id,
                    status = status.as_str(),
                    error = %e,
                    "Failed to write terminal status"
                );
            }
        }
    }
}
