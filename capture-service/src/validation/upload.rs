//! Upload validation gate.
//!
//! Ordered, fail-fast checks over the raw upload bytes. Pure function of its
//! input: no storage, database, or network calls happen here.

use anyhow::anyhow;
use service_core::error::AppError;

/// Canonical PDF media type; the only one accepted.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Every well-formed PDF starts with this signature.
const PDF_MAGIC: &[u8; 5] = b"%PDF-";

/// Window at the end of the file scanned for the encryption dictionary marker.
const ENCRYPTION_SCAN_WINDOW: usize = 8192;

/// Size and page bounds for an upload.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_file_size: usize,
    pub max_pages: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: 20 * 1024 * 1024,
            max_pages: 100,
        }
    }
}

/// Result of a fully passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub page_count: usize,
    /// Present when the trailing bytes carry an `/Encrypt` marker. Not a
    /// validation failure by itself; callers decide the policy.
    pub encrypted: bool,
}

/// Run every check in order and fail on the first violation.
///
/// Check order: declared content type, filename extension, PDF signature,
/// byte length, page count, encryption marker. Either the file passes every
/// check or a specific typed failure comes back; there is no partial result.
pub fn validate_upload(
    data: &[u8],
    content_type: &str,
    filename: &str,
    limits: &UploadLimits,
) -> Result<UploadReport, AppError> {
    if content_type != PDF_CONTENT_TYPE {
        return Err(AppError::UnsupportedMediaType(anyhow!(
            "Only {} uploads are accepted",
            PDF_CONTENT_TYPE
        )));
    }

    let has_pdf_extension = std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !has_pdf_extension {
        return Err(AppError::UnsupportedMediaType(anyhow!(
            "Filename must have a .pdf extension"
        )));
    }

    if data.len() < PDF_MAGIC.len() || &data[..PDF_MAGIC.len()] != PDF_MAGIC {
        return Err(AppError::UnsupportedMediaType(anyhow!(
            "File content is not a PDF"
        )));
    }

    if data.len() > limits.max_file_size {
        return Err(AppError::PayloadTooLarge(anyhow!(
            "File exceeds the maximum size of {} bytes",
            limits.max_file_size
        )));
    }

    let encrypted = has_encryption_marker(data);

    let page_count = match lopdf::Document::load_mem(data) {
        Ok(doc) => doc.get_pages().len(),
        // Encrypted bodies may not parse; page bounds cannot be enforced for
        // them and the caller's encryption policy decides instead.
        Err(_) if encrypted => 0,
        Err(e) => {
            return Err(AppError::ValidationError(anyhow!(
                "File could not be parsed as a PDF document: {}",
                e
            )))
        }
    };

    if !encrypted {
        if page_count == 0 {
            return Err(AppError::ValidationError(anyhow!("PDF has no pages")));
        }
        if page_count > limits.max_pages {
            return Err(AppError::ValidationError(anyhow!(
                "PDF exceeds maximum allowed pages ({})",
                limits.max_pages
            )));
        }
    }

    Ok(UploadReport {
        page_count,
        encrypted,
    })
}

/// Scan the trailing window for the `/Encrypt` entry of the trailer
/// dictionary.
fn has_encryption_marker(data: &[u8]) -> bool {
    let start = data.len().saturating_sub(ENCRYPTION_SCAN_WINDOW);
    let tail = &data[start..];
    tail.windows(b"/Encrypt".len())
        .any(|window| window == b"/Encrypt")
}
