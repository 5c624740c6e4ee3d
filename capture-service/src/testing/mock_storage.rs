use crate::services::storage::ObjectStorage;
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory `ObjectStorage` that records call counts and can be scripted to
/// fail individual operations.
#[derive(Default)]
pub struct MockStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    pub put_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub fail_put: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(key).cloned()
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for MockStorage {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<String, AppError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "simulated storage write failure"
            )));
        }
        self.files.lock().unwrap().insert(key.to_string(), data);
        Ok(format!("mock://{}", key))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "simulated storage read failure"
            )));
        }
        self.files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("no object at {}", key)))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "simulated storage delete failure"
            )));
        }
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        url.strip_prefix("mock://").map(str::to_string)
    }
}
