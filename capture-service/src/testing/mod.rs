//! In-memory collaborator implementations and fixtures for tests.

mod mock_analysis;
mod mock_repository;
mod mock_storage;
mod pdf;

pub use mock_analysis::MockAnalysisProvider;
pub use mock_repository::MockRepository;
pub use mock_storage::MockStorage;
pub use pdf::pdf_with_pages;
