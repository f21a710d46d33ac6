use async_trait::async_trait;
use std::time::Duration;
use tessera_shared::{Company, CompanyDetails, SkuPricing, SubmitResultRequest};
use tokio_util::sync::CancellationToken;

/// Failure of a single provider call
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Provider responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider returned an empty body for {operation}")]
    EmptyBody { operation: &'static str },

    #[error("Malformed provider payload for {operation}: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Circuit breaker [{0}] is open")]
    CircuitOpen(String),

    #[error("Provider call was cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Transport(_) | GatewayError::Timeout(_) => true,
            GatewayError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Status and body of a provider response, undecoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The license provider's remote API.
///
/// Every operation is idempotent and takes the caller's cancellation token.
/// Implementations own wire encoding, retries and timeouts.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// List the companies registered in a country
    async fn list_companies(
        &self,
        country: &str,
        cancel: &CancellationToken,
    ) -> GatewayResult<Vec<Company>>;

    /// Fetch login, contact and entitlements of a company
    async fn get_company_details(
        &self,
        company_id: &str,
        cancel: &CancellationToken,
    ) -> GatewayResult<CompanyDetails>;

    /// Fetch the unit price of a SKU
    async fn get_price(&self, sku: &str, cancel: &CancellationToken) -> GatewayResult<SkuPricing>;

    /// Submit the priced order. Non-success statuses are returned, not raised.
    async fn submit_result(
        &self,
        payload: &SubmitResultRequest,
        cancel: &CancellationToken,
    ) -> GatewayResult<RawResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GatewayError::Transport("connection reset".into()).is_retryable());
        assert!(GatewayError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(GatewayError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(GatewayError::Status { status: 429, body: String::new() }.is_retryable());

        assert!(!GatewayError::Status { status: 404, body: String::new() }.is_retryable());
        assert!(!GatewayError::EmptyBody { operation: "get_price" }.is_retryable());
        assert!(!GatewayError::Cancelled.is_retryable());
        assert!(!GatewayError::CircuitOpen("provider".into()).is_retryable());
    }

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::new(200, "ok").is_success());
        assert!(RawResponse::new(204, "").is_success());
        assert!(!RawResponse::new(302, "").is_success());
        assert!(!RawResponse::new(500, "boom").is_success());
    }
}
