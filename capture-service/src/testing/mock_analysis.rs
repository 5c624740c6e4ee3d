use crate::services::analysis::{
    AnalysisError, AnalysisProvider, ExtractionResult, RawFields, RawLineItem,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

enum Behavior {
    Succeed(serde_json::Value),
    FailTransient(String),
    FailPermanent(String),
}

/// Scriptable `AnalysisProvider`. Defaults to returning an empty extraction.
pub struct MockAnalysisProvider {
    behavior: Mutex<Behavior>,
    pub calls: AtomicUsize,
}

impl Default for MockAnalysisProvider {
    fn default() -> Self {
        Self {
            behavior: Mutex::new(Behavior::Succeed(serde_json::json!({}))),
            calls: AtomicUsize::new(0),
        }
    }
}

impl MockAnalysisProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with the given provider JSON body. The body is parsed the
    /// same way the HTTP client parses real responses.
    pub fn succeed_with(&self, body: serde_json::Value) {
        *self.behavior.lock().unwrap() = Behavior::Succeed(body);
    }

    pub fn fail_transient(&self, message: &str) {
        *self.behavior.lock().unwrap() = Behavior::FailTransient(message.to_string());
    }

    pub fn fail_permanent(&self, message: &str) {
        *self.behavior.lock().unwrap() = Behavior::FailPermanent(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisProvider for MockAnalysisProvider {
    async fn analyze(&self, _data: &[u8]) -> Result<ExtractionResult, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior.lock().unwrap();
        match &*behavior {
            Behavior::Succeed(body) => {
                let fields: RawFields = body
                    .get("fields")
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| AnalysisError::Permanent(anyhow::anyhow!("{}", e)))?
                    .unwrap_or_default();
                let line_items: Vec<RawLineItem> = body
                    .get("line_items")
                    .cloned()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| AnalysisError::Permanent(anyhow::anyhow!("{}", e)))?
                    .unwrap_or_default();
                Ok(ExtractionResult {
                    raw: body.clone(),
                    fields,
                    line_items,
                })
            }
            Behavior::FailTransient(message) => {
                Err(AnalysisError::Transient(anyhow::anyhow!("{}", message.clone())))
            }
            Behavior::FailPermanent(message) => {
                Err(AnalysisError::Permanent(anyhow::anyhow!("{}", message.clone())))
            }
        }
    }
}
