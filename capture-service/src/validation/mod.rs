pub mod upload;

pub use upload::{validate_upload, UploadLimits, UploadReport, PDF_CONTENT_TYPE};
