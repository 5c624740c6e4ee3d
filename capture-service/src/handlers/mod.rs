pub mod documents;
pub mod health;

pub use documents::{delete_document, get_document_status, submit_document};
pub use health::{health_check, metrics_endpoint, readiness_check};
