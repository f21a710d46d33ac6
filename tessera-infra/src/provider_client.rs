use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tessera_core::{GatewayError, GatewayResult, ProviderGateway, RawResponse};
use tessera_shared::{Company, CompanyDetails, Masked, SkuPricing, SubmitResultRequest};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app_config::ProviderConfig;

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, thiserror::Error)]
pub enum ProviderClientError {
    #[error("Invalid provider base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Talks to the license provider's JSON API over HTTP.
///
/// One attempt per call; wrap it in a `ResilientGateway` for retries.
#[derive(Clone)]
pub struct HttpProviderGateway {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<Masked<String>>,
    timeout: Duration,
}

impl HttpProviderGateway {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderClientError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|_| ProviderClientError::InvalidBaseUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(ProviderClientError::InvalidBaseUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            timeout: config.request_timeout(),
        })
    }

    /// Base URL with the given segments appended, each percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> GatewayResult<RawResponse> {
        let request = match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key.expose()),
            None => request,
        };

        let exchange = async {
            let response = request.send().await.map_err(|err| self.transport_error(err))?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(|err| self.transport_error(err))?;
            Ok::<_, GatewayError>(RawResponse { status, body })
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GatewayError::Cancelled),
            result = exchange => result,
        }?;

        debug!(operation, status = response.status, "Provider call completed");
        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
        cancel: &CancellationToken,
    ) -> GatewayResult<T> {
        let response = self.execute(operation, self.client.get(url), cancel).await?;
        decode_body(operation, response)
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

fn decode_body<T: DeserializeOwned>(operation: &'static str, response: RawResponse) -> GatewayResult<T> {
    if !response.is_success() {
        return Err(GatewayError::Status {
            status: response.status,
            body: response.body,
        });
    }

    let body = response.body.trim();
    if body.is_empty() || body == "null" {
        return Err(GatewayError::EmptyBody { operation });
    }

    serde_json::from_str(body).map_err(|err| GatewayError::Decode {
        operation,
        message: err.to_string(),
    })
}

#[async_trait]
impl ProviderGateway for HttpProviderGateway {
    async fn list_companies(
        &self,
        country: &str,
        cancel: &CancellationToken,
    ) -> GatewayResult<Vec<Company>> {
        let mut url = self.endpoint(&["companies"]);
        url.query_pairs_mut().append_pair("country", country);
        self.fetch_json("list_companies", url, cancel).await
    }

    async fn get_company_details(
        &self,
        company_id: &str,
        cancel: &CancellationToken,
    ) -> GatewayResult<CompanyDetails> {
        let url = self.endpoint(&["companies", company_id]);
        self.fetch_json("get_company_details", url, cancel).await
    }

    async fn get_price(&self, sku: &str, cancel: &CancellationToken) -> GatewayResult<SkuPricing> {
        let url = self.endpoint(&["prices", sku]);
        self.fetch_json("get_price", url, cancel).await
    }

    async fn submit_result(
        &self,
        payload: &SubmitResultRequest,
        cancel: &CancellationToken,
    ) -> GatewayResult<RawResponse> {
        let url = self.endpoint(&["results"]);
        self.execute("submit_result", self.client.post(url).json(payload), cancel)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(base_url: &str) -> HttpProviderGateway {
        HttpProviderGateway::new(&ProviderConfig {
            base_url: base_url.to_string(),
            api_key: None,
            request_timeout_ms: 1_000,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let gateway = gateway("http://provider.local/api/");
        let url = gateway.endpoint(&["prices", "SKU 1/2"]);
        assert_eq!(url.as_str(), "http://provider.local/api/prices/SKU%201%2F2");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = HttpProviderGateway::new(&ProviderConfig {
            base_url: "not a url".to_string(),
            api_key: None,
            request_timeout_ms: 1_000,
        });
        assert!(matches!(result, Err(ProviderClientError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_decode_body_classifies_failures() {
        let empty = decode_body::<SkuPricing>("get_price", RawResponse::new(200, "  "));
        assert_eq!(empty.unwrap_err(), GatewayError::EmptyBody { operation: "get_price" });

        let null = decode_body::<SkuPricing>("get_price", RawResponse::new(200, "null"));
        assert!(matches!(null, Err(GatewayError::EmptyBody { .. })));

        let garbage = decode_body::<SkuPricing>("get_price", RawResponse::new(200, "<html>"));
        assert!(matches!(garbage, Err(GatewayError::Decode { .. })));

        let status = decode_body::<SkuPricing>("get_price", RawResponse::new(502, "bad gateway"));
        assert_eq!(
            status.unwrap_err(),
            GatewayError::Status { status: 502, body: "bad gateway".to_string() }
        );
    }
}
