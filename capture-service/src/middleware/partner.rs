use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

/// PartnerId extractor for capture-service.
///
/// Extracts the owning tenant from the X-Partner-ID header placed by the
/// upstream credential verifier after it authenticates the caller. Every
/// read and delete operation checks record ownership against this value.
///
/// Security: the header is only trusted because requests reach this service
/// through the verifier; a missing header means an unauthenticated call.
#[derive(Debug, Clone)]
pub struct PartnerId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for PartnerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let partner_id = parts
            .headers
            .get("X-Partner-ID")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                AppError::AuthError(anyhow::anyhow!(
                    "Missing X-Partner-ID header (required from the credential verifier)"
                ))
            })?;

        // Add to tracing span for observability
        tracing::Span::current().record("partner_id", partner_id);

        Ok(PartnerId(partner_id.to_string()))
    }
}
