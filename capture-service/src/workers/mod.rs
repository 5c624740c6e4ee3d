mod orchestrator;

pub use orchestrator::{AnalysisJob, WorkerOrchestrator};
