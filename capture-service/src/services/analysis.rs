//! Client boundary for the external OCR/analysis provider.

use crate::config::AnalysisConfig;
use crate::validation::PDF_CONTENT_TYPE;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;

/// Provider failures, split by whether a resubmission could plausibly
/// succeed. Both classes terminate the analysis the same way; the split
/// exists for logging and operator triage.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("transient analysis failure: {0}")]
    Transient(anyhow::Error),

    #[error("permanent analysis failure: {0}")]
    Permanent(anyhow::Error),
}

/// Raw field values as the provider extracted them, before normalization.
/// Everything is a string; the result mapper owns parsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFields {
    pub document_number: Option<String>,
    pub vendor_name: Option<String>,
    pub customer_name: Option<String>,
    pub total: Option<String>,
    pub subtotal: Option<String>,
    pub discount: Option<String>,
    pub tax: Option<String>,
    pub currency: Option<String>,
    pub payment_terms: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLineItem {
    pub description: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<String>,
    pub amount: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalyzeEnvelope {
    #[serde(default)]
    fields: RawFields,
    #[serde(default)]
    line_items: Vec<RawLineItem>,
}

/// Successful provider output: the parsed envelope plus the untouched JSON
/// body, which is archived next to the document artifact.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub raw: serde_json::Value,
    pub fields: RawFields,
    pub line_items: Vec<RawLineItem>,
}

#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, data: &[u8]) -> Result<ExtractionResult, AnalysisError>;
}

pub struct HttpAnalysisProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpAnalysisProvider {
    pub fn new(config: &AnalysisConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl AnalysisProvider for HttpAnalysisProvider {
    async fn analyze(&self, data: &[u8]) -> Result<ExtractionResult, AnalysisError> {
        let response = self
            .http
            .post(format!("{}/v1/analyze", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header(CONTENT_TYPE, PDF_CONTENT_TYPE)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| AnalysisError::Transient(anyhow::anyhow!("request failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AnalysisError::Transient(anyhow::anyhow!(
                "provider returned {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(AnalysisError::Permanent(anyhow::anyhow!(
                "provider returned {}",
                status
            )));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            AnalysisError::Permanent(anyhow::anyhow!("provider body was not JSON: {}", e))
        })?;

        let envelope: AnalyzeEnvelope = serde_json::from_value(raw.clone()).map_err(|e| {
            AnalysisError::Permanent(anyhow::anyhow!("unrecognized provider response: {}", e))
        })?;

        Ok(ExtractionResult {
            raw,
            fields: envelope.fields,
            line_items: envelope.line_items,
        })
    }
}
